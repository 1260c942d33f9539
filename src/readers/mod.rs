pub mod chunk_reader;
pub mod line_scanner;
pub mod temperature_parser;

pub use chunk_reader::ChunkReader;
pub use line_scanner::LineScanner;
pub use temperature_parser::parse_temperature;
