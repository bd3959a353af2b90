mod camera;
mod geometry;
mod globe;
mod projector;

pub use camera::{OrbitControls, PerspectiveCamera};
pub use globe::{draw_anchor, GlobeSurface, LineString};
pub use projector::{
    ndc_to_screen, stacking_order, FrameState, GeoProjector, LabelHandle, LabelPlacement, Location,
};
