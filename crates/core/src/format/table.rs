//! The static format and capability table.

use super::types::{BackendId, CapabilityEntry, Category, FormatDescriptor, TargetFilter};

const fn fmt(
    extension: &'static str,
    category: Category,
    aliases: &'static [&'static str],
    readable: bool,
    writable: bool,
    may_be_encrypted: bool,
) -> FormatDescriptor {
    FormatDescriptor {
        extension,
        category,
        aliases,
        readable,
        writable,
        may_be_encrypted,
    }
}

use Category::{Archive, Audio, Document, Image, Video};

pub(crate) const FORMATS: &[FormatDescriptor] = &[
    // Documents: pandoc reads the first group, writes everything but xlsx
    fmt("pdf", Document, &[], true, true, true),
    fmt("docx", Document, &[], true, true, true),
    fmt("doc", Document, &[], true, true, false),
    fmt("txt", Document, &["text"], true, true, false),
    fmt("md", Document, &["markdown"], true, true, false),
    fmt("epub", Document, &[], true, true, false),
    fmt("pptx", Document, &[], true, true, true),
    fmt("xlsx", Document, &[], true, false, true),
    fmt("html", Document, &["htm"], false, true, false),
    fmt("tex", Document, &["latex"], false, true, false),
    fmt("xml", Document, &[], false, true, false),
    fmt("bib", Document, &[], false, true, false),
    fmt("json", Document, &[], false, true, false),
    fmt("rst", Document, &[], false, true, false),
    fmt("rtf", Document, &[], false, true, false),
    fmt("odt", Document, &[], false, true, false),
    fmt("org", Document, &[], false, true, false),
    fmt("ipynb", Document, &[], false, true, false),
    fmt("fb2", Document, &[], false, true, false),
    fmt("icml", Document, &[], false, true, false),
    fmt("opml", Document, &[], false, true, false),
    fmt("texi", Document, &["texinfo"], false, true, false),
    fmt("textile", Document, &[], false, true, false),
    fmt("typ", Document, &[], false, true, false),
    fmt("muse", Document, &[], false, true, false),
    fmt("hs", Document, &[], false, true, false),
    fmt("1", Document, &[], false, true, false),
    fmt("adoc", Document, &["asciidoc"], false, true, false),
    fmt("dj", Document, &[], false, true, false),
    fmt("ms", Document, &[], false, true, false),
    // Images
    fmt("jpg", Image, &["jpeg"], true, true, false),
    fmt("png", Image, &[], true, true, false),
    fmt("webp", Image, &[], true, true, false),
    fmt("gif", Image, &[], true, true, false),
    fmt("bmp", Image, &[], true, true, false),
    fmt("tiff", Image, &["tif"], true, true, false),
    // Audio
    fmt("mp3", Audio, &[], true, true, false),
    fmt("wav", Audio, &[], true, true, false),
    fmt("flac", Audio, &[], true, true, false),
    fmt("aac", Audio, &[], true, true, false),
    fmt("ogg", Audio, &["oga"], true, true, false),
    fmt("m4a", Audio, &[], true, true, false),
    // Video
    fmt("mp4", Video, &["m4v"], true, true, false),
    fmt("avi", Video, &[], true, true, false),
    fmt("mkv", Video, &[], true, true, false),
    fmt("mov", Video, &[], true, true, false),
    fmt("wmv", Video, &[], true, true, false),
    fmt("flv", Video, &[], true, true, false),
    fmt("webm", Video, &[], true, true, false),
    // Archives: 7-Zip cannot create rar
    fmt("zip", Archive, &[], true, true, true),
    fmt("tar", Archive, &[], true, true, false),
    fmt("gz", Archive, &["tgz"], true, true, false),
    fmt("bz2", Archive, &["tbz2"], true, true, false),
    fmt("7z", Archive, &[], true, true, true),
    fmt("rar", Archive, &[], true, false, true),
];

pub(crate) const CAPABILITIES: &[CapabilityEntry] = &[
    CapabilityEntry {
        source: Document,
        target: Document,
        backend: BackendId::Pandoc,
        targets: TargetFilter::AnyWritable,
    },
    CapabilityEntry {
        source: Image,
        target: Image,
        backend: BackendId::ImageMagick,
        targets: TargetFilter::AnyWritable,
    },
    CapabilityEntry {
        source: Image,
        target: Document,
        backend: BackendId::ImageMagick,
        targets: TargetFilter::Only(&["pdf"]),
    },
    CapabilityEntry {
        source: Audio,
        target: Audio,
        backend: BackendId::Ffmpeg,
        targets: TargetFilter::AnyWritable,
    },
    CapabilityEntry {
        source: Video,
        target: Video,
        backend: BackendId::Ffmpeg,
        targets: TargetFilter::AnyWritable,
    },
    CapabilityEntry {
        source: Video,
        target: Image,
        backend: BackendId::Ffmpeg,
        targets: TargetFilter::Only(&["gif"]),
    },
    CapabilityEntry {
        source: Archive,
        target: Archive,
        backend: BackendId::SevenZip,
        targets: TargetFilter::AnyWritable,
    },
];
