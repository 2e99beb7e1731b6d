mod auto_join;
mod detect;
mod merge;
mod preview;
mod resolve;
mod split;

pub use auto_join::{AutoJoin, AutoJoinReport};
pub use detect::{classify, DetectIntersections};
pub use merge::MergeWalls;
pub use preview::{JoinPreview, JoinPreviewQuery};
pub use resolve::{
    infer_kind, role_of, validate_intersection, Resolution, ResolveJunction, WallRole,
};
pub use split::SplitWall;
