pub mod barcode;
pub mod header;
pub mod io;
pub mod json;
pub mod plot;
pub mod quality;
pub mod utils;
