use darkroom_storage::error::{Error, ErrorKind};
use darkroom_storage::{MediaId, RecordId, StoredRecord, TransformMap};
use exn::ResultExt;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RecordRow {
    pub(crate) id: Option<i64>,
    pub(crate) guid: String,
    pub(crate) original_id: Option<i64>,
    pub(crate) edited_id: Option<i64>,
    pub(crate) thumbnail_id: Option<i64>,
    pub(crate) transform: String,
    pub(crate) local_image_changes: bool,
    pub(crate) local_filter_changes: bool,
    pub(crate) last_sync_version: i64,
}
impl TryFrom<&StoredRecord> for RecordRow {
    type Error = Error;
    fn try_from(record: &StoredRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id.map(|id| id.0),
            guid: record.guid.clone(),
            original_id: record.original_id.map(|id| id.0),
            edited_id: record.edited_id.map(|id| id.0),
            thumbnail_id: record.thumbnail_id.map(|id| id.0),
            transform: serde_json::to_string(&record.transform).or_raise(|| ErrorKind::InvalidData("transform"))?,
            local_image_changes: record.local_image_changes,
            local_filter_changes: record.local_filter_changes,
            last_sync_version: record.last_sync_version,
        })
    }
}
impl TryFrom<RecordRow> for StoredRecord {
    type Error = Error;
    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        // An empty column is treated the same as an empty mapping.
        let transform = if row.transform.trim().is_empty() {
            TransformMap::new()
        } else {
            serde_json::from_str::<TransformMap>(&row.transform).or_raise(|| ErrorKind::InvalidData("transform"))?
        };
        Ok(Self {
            id: row.id.map(RecordId),
            guid: row.guid,
            original_id: row.original_id.map(MediaId),
            edited_id: row.edited_id.map(MediaId),
            thumbnail_id: row.thumbnail_id.map(MediaId),
            transform,
            local_image_changes: row.local_image_changes,
            local_filter_changes: row.local_filter_changes,
            last_sync_version: row.last_sync_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row(transform: &str) -> RecordRow {
        RecordRow {
            id: Some(3),
            guid: "7d1f0c4e-4c55-4bb6-9b53-3f1f0c7b9a10".to_string(),
            original_id: Some(10),
            edited_id: None,
            thumbnail_id: Some(12),
            transform: transform.to_string(),
            local_image_changes: true,
            local_filter_changes: false,
            last_sync_version: 7,
        }
    }

    #[rstest]
    #[case("", 0)]
    #[case("{}", 0)]
    #[case(r#"{"exposure":1.5}"#, 1)]
    #[case(r#"{"exposure":1.5,"contrast":-20.0}"#, 2)]
    fn test_row_to_model(#[case] transform: &str, #[case] keys: usize) {
        let model = StoredRecord::try_from(row(transform)).unwrap();
        assert_eq!(model.id, Some(RecordId(3)));
        assert_eq!(model.original_id, Some(MediaId(10)));
        assert_eq!(model.edited_id, None);
        assert_eq!(model.thumbnail_id, Some(MediaId(12)));
        assert_eq!(model.transform.len(), keys);
        assert!(model.local_image_changes);
        assert!(!model.local_filter_changes);
        assert_eq!(model.last_sync_version, 7);
    }

    #[rstest]
    #[case("not json")]
    #[case("[1, 2, 3]")]
    fn test_row_to_model_invalid_transform(#[case] transform: &str) {
        let err = StoredRecord::try_from(row(transform)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("transform")));
    }

    #[test]
    fn test_model_to_row() {
        let model = StoredRecord::try_from(row(r#"{"saturation":25.0}"#)).unwrap();
        let row = RecordRow::try_from(&model).unwrap();
        assert_eq!(row.transform, r#"{"saturation":25.0}"#);
        assert_eq!(row.original_id, Some(10));
        assert_eq!(row.id, Some(3));
    }
}
