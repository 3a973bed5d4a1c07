use crate::model::{LinkId, MarkerId, PanoramaId};
use std::fmt;

/// Store operation that failed, carried in [`StoreError`] so the operator
/// message can say what was being attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FetchPanoramas,
    FetchMarkers,
    FetchLinks,
    FetchDependents,
    InsertPanorama,
    UpdatePanorama,
    DeletePanorama,
    InsertMarker,
    UpdateMarker,
    DeleteMarker,
    InsertLink,
    UpdateLink,
    DeleteLink,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoreOp::FetchPanoramas => "fetch panoramas",
            StoreOp::FetchMarkers => "fetch markers",
            StoreOp::FetchLinks => "fetch links",
            StoreOp::FetchDependents => "list dependent rows",
            StoreOp::InsertPanorama => "insert panorama",
            StoreOp::UpdatePanorama => "update panorama",
            StoreOp::DeletePanorama => "delete panorama",
            StoreOp::InsertMarker => "insert marker",
            StoreOp::UpdateMarker => "update marker",
            StoreOp::DeleteMarker => "delete marker",
            StoreOp::InsertLink => "insert link",
            StoreOp::UpdateLink => "update link",
            StoreOp::DeleteLink => "delete link",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("could not {op}: {message}")]
pub struct StoreError {
    pub op: StoreOp,
    pub message: String,
}

impl StoreError {
    pub fn new(op: StoreOp, message: impl Into<String>) -> Self {
        Self {
            op,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PanoError {
    #[error("save the panorama before adding markers or links to it")]
    UnsavedPanorama,
    #[error("panorama {0} does not exist")]
    UnknownPanorama(PanoramaId),
    #[error("marker {0} is not part of the current scene")]
    UnknownMarker(MarkerId),
    #[error("link {0} is not part of the current scene")]
    UnknownLink(LinkId),
    #[error("link {link} points at panorama {target}, which does not exist")]
    DanglingLink { link: LinkId, target: PanoramaId },
    #[error("marker position is too close to the camera")]
    DegeneratePosition,
    #[error("unknown marker type {0:?}")]
    UnknownMarkerKind(String),
    #[error("{0} markers need a media URL")]
    MissingMediaUrl(&'static str),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    #[error("no scene is open")]
    NoScene,
    #[error("invalid viewer config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, PanoError>;
