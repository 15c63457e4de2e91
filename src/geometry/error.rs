// src/geometry/error.rs
use geo::algorithm::validation::{InvalidPolygon, RingRole};
use thiserror::Error;

/// Gründe, aus denen ein Ring, ein Polygon oder ein MultiPolygon als ungültig gilt.
/// Der `Display`-Text wird unverändert als Diagnose-Grund weitergereicht.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{ring} has fewer than 3 distinct vertices")]
    TooFewVertices { ring: RingRole },

    #[error("{ring} has a non-finite coordinate at vertex {index}")]
    NonFiniteCoordinate { ring: RingRole, index: usize },

    #[error("{ring} intersects or touches itself")]
    SelfIntersection { ring: RingRole },

    #[error("{ring} encloses zero area")]
    ZeroAreaRing { ring: RingRole },

    #[error("geometry encloses zero area")]
    ZeroArea,

    #[error("interior ring {hole} is not contained in the exterior ring")]
    HoleOutsideShell { hole: usize },

    #[error("{first} and {second} share a boundary segment")]
    RingsShareEdge { first: RingRole, second: RingRole },

    #[error("interior rings {first} and {second} overlap")]
    HolesOverlap { first: usize, second: usize },

    #[error("interior ring {hole} touches the exterior ring at {touches} points")]
    HoleTouchesShell { hole: usize, touches: usize },

    #[error("interior rings {first} and {second} touch at {touches} points")]
    HolesTouch {
        first: usize,
        second: usize,
        touches: usize,
    },

    #[error("polygons {first} and {second} overlap")]
    PolygonsOverlap { first: usize, second: usize },
}

impl ValidationError {
    /// Setzt die Ringrolle bei Fehlern, die an einem einzeln geprüften Ring entstanden sind.
    pub fn in_ring(self, role: RingRole) -> Self {
        match self {
            ValidationError::TooFewVertices { .. } => ValidationError::TooFewVertices { ring: role },
            ValidationError::NonFiniteCoordinate { index, .. } => {
                ValidationError::NonFiniteCoordinate { ring: role, index }
            }
            ValidationError::SelfIntersection { .. } => ValidationError::SelfIntersection { ring: role },
            ValidationError::ZeroAreaRing { .. } => ValidationError::ZeroAreaRing { ring: role },
            other => other,
        }
    }
}

fn hole_index(role: RingRole) -> usize {
    match role {
        RingRole::Interior(index) => index,
        RingRole::Exterior => 0,
    }
}

impl From<InvalidPolygon> for ValidationError {
    fn from(err: InvalidPolygon) -> Self {
        match err {
            InvalidPolygon::TooFewPointsInRing(ring) => ValidationError::TooFewVertices { ring },
            InvalidPolygon::SelfIntersection(ring) => ValidationError::SelfIntersection { ring },
            InvalidPolygon::NonFiniteCoord(ring, index) => ValidationError::NonFiniteCoordinate {
                ring,
                index: index.0,
            },
            InvalidPolygon::InteriorRingNotContainedInExteriorRing(ring) => {
                ValidationError::HoleOutsideShell {
                    hole: hole_index(ring),
                }
            }
            InvalidPolygon::IntersectingRingsOnALine(first, second) => {
                ValidationError::RingsShareEdge { first, second }
            }
            InvalidPolygon::IntersectingRingsOnAnArea(first, second) => ValidationError::HolesOverlap {
                first: hole_index(first),
                second: hole_index(second),
            },
        }
    }
}

/// Fehler, die eine ganze Verarbeitungseinheit (oder einen ganzen Record-Stream) abbrechen.
/// Alles, was sich auf einen einzelnen Record beschränkt, landet stattdessen in den Diagnosen.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("record {record} has shape type {found}, only Polygon records are accepted")]
    UnsupportedShapeType { record: usize, found: String },

    #[error("aggregation received no polygons")]
    AggregateEmpty,

    #[error("aggregate geometry is invalid: {0}")]
    AggregateInvalid(ValidationError),

    #[error("malformed geometry document: {message}")]
    MalformedDocument { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("buffering by {distance_m} m failed: {message}")]
    BufferFailed { distance_m: f64, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Shapefile(#[from] shapefile::Error),

    #[error(transparent)]
    Persist(#[from] tempfile::PersistError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
