use serde::{Deserialize, Serialize};

/// Named survey parameters carried in `<params><param>` pairs.
///
/// Variant order is the export column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamField {
    History,
    EventDate,
    EventTime,
    District,
    State,
    Length,
    Breadth,
    Height,
    TypeLandslide,
    Material,
    Occurrence,
    StructureAffected,
    TriggerLandslide,
    Causes,
    LandslideCategory,
    Remedial,
}

impl ParamField {
    pub const ALL: [ParamField; 16] = [
        ParamField::History,
        ParamField::EventDate,
        ParamField::EventTime,
        ParamField::District,
        ParamField::State,
        ParamField::Length,
        ParamField::Breadth,
        ParamField::Height,
        ParamField::TypeLandslide,
        ParamField::Material,
        ParamField::Occurrence,
        ParamField::StructureAffected,
        ParamField::TriggerLandslide,
        ParamField::Causes,
        ParamField::LandslideCategory,
        ParamField::Remedial,
    ];

    /// Value of `<paramname>` in the survey document.
    pub fn param_name(self) -> &'static str {
        match self {
            ParamField::History => "History",
            ParamField::EventDate => "EventDate",
            ParamField::EventTime => "EventTime",
            ParamField::District => "District",
            ParamField::State => "State",
            ParamField::Length => "length",
            ParamField::Breadth => "Breadth",
            ParamField::Height => "Height",
            ParamField::TypeLandslide => "TypeLandslide",
            ParamField::Material => "Material",
            ParamField::Occurrence => "Occurrence",
            ParamField::StructureAffected => "StructureAffected",
            ParamField::TriggerLandslide => "TriggerLandslide",
            ParamField::Causes => "Causes",
            ParamField::LandslideCategory => "LandslideCategory",
            ParamField::Remedial => "Remedial",
        }
    }

    /// Column name used in exports.
    pub fn column(self) -> &'static str {
        match self {
            ParamField::History => "history",
            ParamField::EventDate => "event_date_reported",
            ParamField::EventTime => "event_time_reported",
            ParamField::District => "district",
            ParamField::State => "state",
            ParamField::Length => "length_m",
            ParamField::Breadth => "breadth_m",
            ParamField::Height => "height_m",
            ParamField::TypeLandslide => "type_landslide",
            ParamField::Material => "material",
            ParamField::Occurrence => "occurrence",
            ParamField::StructureAffected => "structure",
            ParamField::TriggerLandslide => "trigger",
            ParamField::Causes => "causes",
            ParamField::LandslideCategory => "landslide_category",
            ParamField::Remedial => "remedial",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamValues {
    pub history: String,
    pub event_date_reported: String,
    pub event_time_reported: String,
    pub district: String,
    pub state: String,
    pub length_m: String,
    pub breadth_m: String,
    pub height_m: String,
    pub type_landslide: String,
    pub material: String,
    pub occurrence: String,
    pub structure: String,
    pub trigger: String,
    pub causes: String,
    pub landslide_category: String,
    pub remedial: String,
}

impl ParamValues {
    pub fn get(&self, field: ParamField) -> &str {
        match field {
            ParamField::History => &self.history,
            ParamField::EventDate => &self.event_date_reported,
            ParamField::EventTime => &self.event_time_reported,
            ParamField::District => &self.district,
            ParamField::State => &self.state,
            ParamField::Length => &self.length_m,
            ParamField::Breadth => &self.breadth_m,
            ParamField::Height => &self.height_m,
            ParamField::TypeLandslide => &self.type_landslide,
            ParamField::Material => &self.material,
            ParamField::Occurrence => &self.occurrence,
            ParamField::StructureAffected => &self.structure,
            ParamField::TriggerLandslide => &self.trigger,
            ParamField::Causes => &self.causes,
            ParamField::LandslideCategory => &self.landslide_category,
            ParamField::Remedial => &self.remedial,
        }
    }

    pub fn get_mut(&mut self, field: ParamField) -> &mut String {
        match field {
            ParamField::History => &mut self.history,
            ParamField::EventDate => &mut self.event_date_reported,
            ParamField::EventTime => &mut self.event_time_reported,
            ParamField::District => &mut self.district,
            ParamField::State => &mut self.state,
            ParamField::Length => &mut self.length_m,
            ParamField::Breadth => &mut self.breadth_m,
            ParamField::Height => &mut self.height_m,
            ParamField::TypeLandslide => &mut self.type_landslide,
            ParamField::Material => &mut self.material,
            ParamField::Occurrence => &mut self.occurrence,
            ParamField::StructureAffected => &mut self.structure,
            ParamField::TriggerLandslide => &mut self.trigger,
            ParamField::Causes => &mut self.causes,
            ParamField::LandslideCategory => &mut self.landslide_category,
            ParamField::Remedial => &mut self.remedial,
        }
    }

    fn values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        [
            &mut self.history,
            &mut self.event_date_reported,
            &mut self.event_time_reported,
            &mut self.district,
            &mut self.state,
            &mut self.length_m,
            &mut self.breadth_m,
            &mut self.height_m,
            &mut self.type_landslide,
            &mut self.material,
            &mut self.occurrence,
            &mut self.structure,
            &mut self.trigger,
            &mut self.causes,
            &mut self.landslide_category,
            &mut self.remedial,
        ]
        .into_iter()
    }
}

/// The five scalar fields of a `<photo>` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoField {
    Name,
    Lat,
    Lon,
    Acc,
    Dir,
}

impl PhotoField {
    pub const ALL: [PhotoField; 5] = [
        PhotoField::Name,
        PhotoField::Lat,
        PhotoField::Lon,
        PhotoField::Acc,
        PhotoField::Dir,
    ];

    /// Element name inside `<photo>`, also the long-form column name.
    pub fn element(self) -> &'static str {
        match self {
            PhotoField::Name => "photoname",
            PhotoField::Lat => "photolat",
            PhotoField::Lon => "photolon",
            PhotoField::Acc => "photoacc",
            PhotoField::Dir => "photodir",
        }
    }

    /// Suffix used by flattened `photoN_*` columns.
    pub fn suffix(self) -> &'static str {
        match self {
            PhotoField::Name => "name",
            PhotoField::Lat => "lat",
            PhotoField::Lon => "lon",
            PhotoField::Acc => "acc",
            PhotoField::Dir => "dir",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// 1-based position within the observation.
    pub index: usize,
    pub photoname: String,
    pub photolat: String,
    pub photolon: String,
    pub photoacc: String,
    pub photodir: String,
}

impl PhotoRecord {
    pub fn get(&self, field: PhotoField) -> &str {
        match field {
            PhotoField::Name => &self.photoname,
            PhotoField::Lat => &self.photolat,
            PhotoField::Lon => &self.photolon,
            PhotoField::Acc => &self.photoacc,
            PhotoField::Dir => &self.photodir,
        }
    }

    pub fn get_mut(&mut self, field: PhotoField) -> &mut String {
        match field {
            PhotoField::Name => &mut self.photoname,
            PhotoField::Lat => &mut self.photolat,
            PhotoField::Lon => &mut self.photolon,
            PhotoField::Acc => &mut self.photoacc,
            PhotoField::Dir => &mut self.photodir,
        }
    }
}

/// One `<observation>` flattened into a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub source_file: String,
    pub seqno: String,
    pub featuretype: String,
    pub featurecoords_raw: String,
    pub lat: String,
    pub lon: String,
    pub altitude_m: String,
    pub gps_accuracy: String,
    pub gps_speed: String,
    pub event_timestamp: String,
    pub gps_type: String,
    pub observer: String,
    #[serde(flatten)]
    pub params: ParamValues,
    pub photos: Vec<PhotoRecord>,
}

impl ObservationRecord {
    pub fn param(&self, field: ParamField) -> &str {
        self.params.get(field)
    }

    /// Photo at 0-based `position`, if the observation has that many.
    pub fn photo(&self, position: usize) -> Option<&PhotoRecord> {
        self.photos.get(position)
    }

    /// Both derived coordinates are numbers inside the WGS84 ranges.
    pub fn has_valid_coordinates(&self) -> bool {
        parse_latitude(&self.lat).is_some() && parse_longitude(&self.lon).is_some()
    }

    pub(crate) fn trim_fields(&mut self) {
        let scalars = [
            &mut self.source_file,
            &mut self.seqno,
            &mut self.featuretype,
            &mut self.featurecoords_raw,
            &mut self.lat,
            &mut self.lon,
            &mut self.altitude_m,
            &mut self.gps_accuracy,
            &mut self.gps_speed,
            &mut self.event_timestamp,
            &mut self.gps_type,
            &mut self.observer,
        ];
        for value in scalars.into_iter().chain(self.params.values_mut()) {
            trim_in_place(value);
        }
        for photo in &mut self.photos {
            for field in PhotoField::ALL {
                trim_in_place(photo.get_mut(field));
            }
        }
    }
}

/// Latitude in decimal degrees, if `text` is a number within [-90, 90].
pub fn parse_latitude(text: &str) -> Option<f64> {
    parse_degrees(text, 90.0)
}

/// Longitude in decimal degrees, if `text` is a number within [-180, 180].
pub fn parse_longitude(text: &str) -> Option<f64> {
    parse_degrees(text, 180.0)
}

fn parse_degrees(text: &str, limit: f64) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| (-limit..=limit).contains(value))
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_ranges() {
        assert_eq!(parse_latitude(" -90 "), Some(-90.0));
        assert_eq!(parse_latitude("12.90"), Some(12.9));
        assert_eq!(parse_latitude("90.0001"), None);
        assert_eq!(parse_latitude("NaN"), None);
        assert_eq!(parse_latitude(""), None);
        assert_eq!(parse_longitude("180"), Some(180.0));
        assert_eq!(parse_longitude("500"), None);
        assert_eq!(parse_longitude("inf"), None);
        assert_eq!(parse_longitude("east"), None);
    }

    #[test]
    fn test_has_valid_coordinates() {
        let mut record = ObservationRecord {
            lat: "12.9".to_string(),
            lon: "77.5".to_string(),
            ..ObservationRecord::default()
        };
        assert!(record.has_valid_coordinates());

        record.lat = "95".to_string();
        assert!(!record.has_valid_coordinates());

        record.lat = "12.9".to_string();
        record.lon = "500".to_string();
        assert!(!record.has_valid_coordinates());
    }

    #[test]
    fn test_param_columns_are_unique() {
        let mut columns: Vec<_> = ParamField::ALL.iter().map(|p| p.column()).collect();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), 16);
    }

    #[test]
    fn test_param_get_mut_round_trips() {
        let mut params = ParamValues::default();
        *params.get_mut(ParamField::StructureAffected) = "Road".to_string();
        assert_eq!(params.get(ParamField::StructureAffected), "Road");
        assert_eq!(params.structure, "Road");
    }

    #[test]
    fn test_trim_fields_covers_params_and_photos() {
        let mut record = ObservationRecord {
            seqno: "  4 ".to_string(),
            photos: vec![PhotoRecord {
                index: 1,
                photoname: "\n img.jpg\t".to_string(),
                ..PhotoRecord::default()
            }],
            ..ObservationRecord::default()
        };
        *record.params.get_mut(ParamField::Remedial) = " none ".to_string();

        record.trim_fields();

        assert_eq!(record.seqno, "4");
        assert_eq!(record.param(ParamField::Remedial), "none");
        assert_eq!(record.photos[0].photoname, "img.jpg");
    }
}
