//! Page-range expressions such as `1-3,5,7-9`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageRangeError {
    #[error("no page ranges given")]
    Empty,

    #[error("invalid page range token {token:?}")]
    InvalidToken { token: String },

    #[error("page range {start}-{end} starts after it ends")]
    Reversed { start: u32, end: u32 },

    #[error("page {page} is out of bounds (document has {page_count} pages)")]
    OutOfBounds { page: u32, page_count: u32 },

    #[error("page range {range} is listed twice")]
    Duplicate { range: PageRange },
}

/// An inclusive, 1-based page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn single(page: u32) -> Self {
        Self {
            start: page,
            end: page,
        }
    }

    pub fn page_count(&self) -> u32 {
        self.end - self.start + 1
    }

    /// File name suffix: `p3` or `p1-3`.
    pub fn suffix(&self) -> String {
        if self.start == self.end {
            format!("p{}", self.start)
        } else {
            format!("p{}-{}", self.start, self.end)
        }
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

fn page_number(token: &str, raw: &str) -> Result<u32, PageRangeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PageRangeError::InvalidToken {
            token: token.to_string(),
        });
    }
    trimmed.parse().map_err(|_| PageRangeError::InvalidToken {
        token: token.to_string(),
    })
}

/// Parses a comma-separated list of pages and inclusive ranges, checked
/// against `page_count`. Ranges keep the order they were written in.
pub fn parse_page_ranges(list: &str, page_count: u32) -> Result<Vec<PageRange>, PageRangeError> {
    if list.trim().is_empty() {
        return Err(PageRangeError::Empty);
    }

    let mut ranges: Vec<PageRange> = Vec::new();
    for token in list.split(',') {
        let range = match token.split_once('-') {
            Some((start, end)) => PageRange {
                start: page_number(token, start)?,
                end: page_number(token, end)?,
            },
            None => PageRange::single(page_number(token, token)?),
        };

        if range.start > range.end {
            return Err(PageRangeError::Reversed {
                start: range.start,
                end: range.end,
            });
        }
        for page in [range.start, range.end] {
            if page == 0 || page > page_count {
                return Err(PageRangeError::OutOfBounds { page, page_count });
            }
        }
        if ranges.contains(&range) {
            return Err(PageRangeError::Duplicate { range });
        }
        ranges.push(range);
    }

    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_ranges_keep_order() {
        let ranges = parse_page_ranges("1-3,5,7-9", 10).unwrap();
        assert_eq!(
            ranges,
            vec![
                PageRange { start: 1, end: 3 },
                PageRange::single(5),
                PageRange { start: 7, end: 9 },
            ]
        );
        assert_eq!(ranges[0].page_count(), 3);

        let reordered = parse_page_ranges(" 9 , 2-4 ", 10).unwrap();
        assert_eq!(reordered[0], PageRange::single(9));
        assert_eq!(reordered[1].suffix(), "p2-4");
    }

    #[test]
    fn test_out_of_bounds() {
        assert_eq!(
            parse_page_ranges("1-3,99", 10),
            Err(PageRangeError::OutOfBounds {
                page: 99,
                page_count: 10
            })
        );
        assert!(matches!(
            parse_page_ranges("0", 10),
            Err(PageRangeError::OutOfBounds { page: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_tokens() {
        for ranges in ["a", "1-", "-3", "1,,2", "1-2-3", "+4", "1.5"] {
            assert!(
                matches!(
                    parse_page_ranges(ranges, 10),
                    Err(PageRangeError::InvalidToken { .. })
                ),
                "{} should be invalid",
                ranges
            );
        }
        assert_eq!(parse_page_ranges("  ", 10), Err(PageRangeError::Empty));
    }

    #[test]
    fn test_reversed_and_duplicate() {
        assert_eq!(
            parse_page_ranges("5-2", 10),
            Err(PageRangeError::Reversed { start: 5, end: 2 })
        );
        assert!(matches!(
            parse_page_ranges("2,2", 10),
            Err(PageRangeError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_suffix_and_display() {
        assert_eq!(PageRange::single(4).suffix(), "p4");
        assert_eq!(PageRange { start: 1, end: 3 }.to_string(), "1-3");
    }
}
