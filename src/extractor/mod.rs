pub mod batch;
pub mod photos;
pub mod record;
pub mod xml_extractor;

pub use batch::{extract_files, ExtractionBatch};
pub use photos::photos_of;
pub use record::{
    parse_latitude, parse_longitude, ObservationRecord, ParamField, ParamValues, PhotoField,
    PhotoRecord,
};
pub use xml_extractor::{extract, split_featurecoords, Extraction, FieldExtractor};
