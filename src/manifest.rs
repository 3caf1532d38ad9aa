use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    config::RenderConfig,
    export::job::ExportRequest,
    foundation::error::{MontageError, MontageResult},
    media::{
        decode::load_image,
        item::{MediaItem, StillImage, VideoClip},
    },
    timeline::model::FillerClip,
    transform::orientation::Orientation,
};

/// One input entry: `{"image": "a.jpg"}` or `{"video": "b.mov"}`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ManifestItem {
    Image {
        image: PathBuf,
        /// Overrides the EXIF orientation.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        orientation: Option<Orientation>,
    },
    Video {
        video: PathBuf,
    },
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestFiller {
    #[default]
    Solid,
    Clip(PathBuf),
    None,
}

/// JSON description of an export.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub config: RenderConfig,
    pub items: Vec<ManifestItem>,
    #[serde(default)]
    pub filler: ManifestFiller,
    #[serde(default)]
    pub seed: u64,
}

impl Manifest {
    pub fn from_json(bytes: &[u8]) -> MontageResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| MontageError::serde(e.to_string()))
    }

    /// Read a manifest file; relative paths inside it are taken from its directory.
    pub fn load(path: &Path) -> MontageResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read manifest '{}'", path.display()))?;
        let mut manifest = Self::from_json(&bytes)?;
        manifest.resolve_paths(path.parent().unwrap_or_else(|| Path::new(".")));
        Ok(manifest)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for item in &mut self.items {
            match item {
                ManifestItem::Image { image, .. } => fix(image),
                ManifestItem::Video { video } => fix(video),
            }
        }
        if let ManifestFiller::Clip(p) = &mut self.filler {
            fix(p);
        }
        if let Some(audio) = &mut self.config.audio {
            fix(&mut audio.source);
        }
        if let Some(caption) = &mut self.config.caption {
            fix(&mut caption.image);
        }
    }

    /// Load stills and probe clips.
    ///
    /// Unreadable inputs become empty items, which the timeline builder then skips.
    pub fn to_items(&self) -> Vec<MediaItem> {
        self.items
            .iter()
            .map(|item| match item {
                ManifestItem::Image { image, orientation } => {
                    let still = match load_image(image) {
                        Ok(still) => still,
                        Err(err) => {
                            tracing::warn!(image = %image.display(), %err, "image could not be loaded");
                            StillImage::solid(0, 0, [0, 0, 0, 0])
                        }
                    };
                    let still = match orientation {
                        Some(o) => still.with_orientation(*o),
                        None => still,
                    };
                    MediaItem::image(still)
                }
                ManifestItem::Video { video } => MediaItem::video(VideoClip::open(video.as_path())),
            })
            .collect()
    }

    pub fn filler_clip(&self) -> Option<FillerClip> {
        match &self.filler {
            ManifestFiller::Solid => Some(FillerClip::Solid),
            ManifestFiller::Clip(p) => Some(FillerClip::Clip(VideoClip::open(p.as_path()))),
            ManifestFiller::None => None,
        }
    }

    pub fn into_request(self, output: impl Into<PathBuf>) -> ExportRequest {
        let items = self.to_items();
        let filler = self.filler_clip();
        let mut request = ExportRequest::new(items, self.config, output).with_seed(self.seed);
        request.filler = filler;
        request
    }
}
