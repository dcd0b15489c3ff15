use crate::extractor::record::{PhotoField, PhotoRecord};
use crate::extractor::xml_extractor::{path_text, select};
use roxmltree::Node;

/// Collects the `photos/photo` entries of one observation in document order.
///
/// Every `<photo>` yields a record; absent sub-elements become empty strings.
pub fn photos_of(observation: Node<'_, '_>) -> Vec<PhotoRecord> {
    select(observation, &["photos", "photo"])
        .enumerate()
        .map(|(position, photo)| {
            let mut record = PhotoRecord {
                index: position + 1,
                ..PhotoRecord::default()
            };
            for field in PhotoField::ALL {
                *record.get_mut(field) = path_text(photo, &[field.element()]);
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    #[test]
    fn test_photos_numbered_in_document_order() {
        let xml = r#"<observation>
            <photos>
                <photo><photoname>a.jpg</photoname><photolat>12.1</photolat></photo>
                <photo><photoname>b.jpg</photoname></photo>
            </photos>
            <photos>
                <photo><photoname>c.jpg</photoname></photo>
            </photos>
        </observation>"#;
        let doc = Document::parse(xml).unwrap();

        let photos = photos_of(doc.root_element());

        assert_eq!(photos.len(), 3);
        assert_eq!(photos[0].index, 1);
        assert_eq!(photos[0].photoname, "a.jpg");
        assert_eq!(photos[0].photolat, "12.1");
        assert_eq!(photos[1].index, 2);
        assert_eq!(photos[2].index, 3);
        assert_eq!(photos[2].photoname, "c.jpg");
    }

    #[test]
    fn test_missing_sub_fields_keep_the_photo() {
        let xml = "<observation><photos><photo/><photo><photodir>N</photodir></photo></photos></observation>";
        let doc = Document::parse(xml).unwrap();

        let photos = photos_of(doc.root_element());

        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0], PhotoRecord { index: 1, ..PhotoRecord::default() });
        assert_eq!(photos[1].photodir, "N");
        assert_eq!(photos[1].photoname, "");
    }

    #[test]
    fn test_nested_photo_outside_photos_is_ignored() {
        let xml = "<observation><photo><photoname>stray.jpg</photoname></photo></observation>";
        let doc = Document::parse(xml).unwrap();

        assert!(photos_of(doc.root_element()).is_empty());
    }
}
