//! Dispatch from a routed backend id to an implementation.

use std::sync::Arc;

use crate::format::BackendId;

use super::config::BackendConfig;
use super::ffmpeg::FfmpegBackend;
use super::imagemagick::ImageMagickBackend;
use super::pandoc::PandocBackend;
use super::sevenzip::SevenZipBackend;
use super::traits::Backend;

/// One implementation per [`BackendId`].
///
/// Lookup is an exhaustive match, so adding a backend id without wiring an
/// implementation does not compile.
#[derive(Clone)]
pub struct BackendSet {
    pandoc: Arc<dyn Backend>,
    imagemagick: Arc<dyn Backend>,
    ffmpeg: Arc<dyn Backend>,
    sevenzip: Arc<dyn Backend>,
}

impl BackendSet {
    pub fn new(
        pandoc: Arc<dyn Backend>,
        imagemagick: Arc<dyn Backend>,
        ffmpeg: Arc<dyn Backend>,
        sevenzip: Arc<dyn Backend>,
    ) -> Self {
        Self {
            pandoc,
            imagemagick,
            ffmpeg,
            sevenzip,
        }
    }

    /// The external-tool backends.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(
            Arc::new(PandocBackend::new(config.clone())),
            Arc::new(ImageMagickBackend::new(config.clone())),
            Arc::new(FfmpegBackend::new(config.clone())),
            Arc::new(SevenZipBackend::new(config.clone())),
        )
    }

    /// The same implementation for every id. Used with test doubles.
    pub fn uniform(backend: Arc<dyn Backend>) -> Self {
        Self::new(backend.clone(), backend.clone(), backend.clone(), backend)
    }

    pub fn get(&self, id: BackendId) -> &Arc<dyn Backend> {
        match id {
            BackendId::Pandoc => &self.pandoc,
            BackendId::ImageMagick => &self.imagemagick,
            BackendId::Ffmpeg => &self.ffmpeg,
            BackendId::SevenZip => &self.sevenzip,
        }
    }
}

impl std::fmt::Debug for BackendSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSet")
            .field("pandoc", &self.pandoc.name())
            .field("imagemagick", &self.imagemagick.name())
            .field("ffmpeg", &self.ffmpeg.name())
            .field("sevenzip", &self.sevenzip.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_id() {
        let set = BackendSet::from_config(&BackendConfig::default());
        for id in [
            BackendId::Pandoc,
            BackendId::ImageMagick,
            BackendId::Ffmpeg,
            BackendId::SevenZip,
        ] {
            assert_eq!(set.get(id).id(), id);
        }
    }
}
