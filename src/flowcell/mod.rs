pub mod dump;
pub mod error;
pub mod flow_cell;
pub mod grid;
pub mod lane;
pub mod micro_tile;
pub mod policy;
pub mod read_facts;
pub mod stats;
pub mod tile;
pub mod widen;

pub use error::FlowCellError;
pub use flow_cell::FlowCell;
pub use grid::GridConfig;
pub use lane::Lane;
pub use micro_tile::MicroTile;
pub use policy::DiscardPolicy;
pub use read_facts::{AlignmentOutcome, KmerOutcome, ReadFacts, ReadObservation};
pub use stats::FlowCellStats;
pub use tile::Tile;
pub use widen::{WidenStop, Widened};
