pub mod coords;
pub mod hit_testing;
pub mod shapes;

pub use coords::{CoordinateMapper, DocPoint, DocRect, PageSize, Position, Size, snap};
