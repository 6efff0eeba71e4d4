//! Column-oriented views of traced data, as Arrow RecordBatches.
//!
//! A messages view has one row per traced record; a participants view folds
//! each participant's records into one row. Both carry the same columns:
//! `participant_uuid`, `consent_withdrawn`, one `Utf8` column per raw field
//! and one `List<Utf8>` column of code ids per coded field.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, BooleanBuilder, ListArray, ListBuilder, StringArray,
    StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use engage_core::codes::{CONSENT_WITHDRAWN_KEY, PARTICIPANT_UUID_KEY};
use engage_core::{Code, ColumnConfiguration, TracedRecord};

use crate::AnalysisError;

/// Separator between a participant's messages in the participants view.
const RAW_JOIN: &str = "; ";

pub struct ColumnView {
    batch: RecordBatch,
}

/// Distinct raw and coded field names, in first-configured order.
struct ViewLayout {
    raw_fields: Vec<String>,
    coded_fields: Vec<String>,
}

struct ViewRow {
    participant_uuid: Option<String>,
    consent_withdrawn: bool,
    raw: Vec<Option<String>>,
    code_ids: Vec<Vec<String>>,
}

impl ViewLayout {
    fn new(columns: &[ColumnConfiguration]) -> Self {
        let mut raw_fields: Vec<String> = Vec::new();
        let mut coded_fields: Vec<String> = Vec::new();
        for c in columns {
            if !raw_fields.contains(&c.raw_field) {
                raw_fields.push(c.raw_field.clone());
            }
            if !coded_fields.contains(&c.coded_field) {
                coded_fields.push(c.coded_field.clone());
            }
        }
        Self {
            raw_fields,
            coded_fields,
        }
    }

    fn schema(&self) -> Schema {
        let mut fields = vec![
            Field::new(PARTICIPANT_UUID_KEY, DataType::Utf8, true),
            Field::new(CONSENT_WITHDRAWN_KEY, DataType::Boolean, false),
        ];
        for name in &self.raw_fields {
            fields.push(Field::new(name, DataType::Utf8, true));
        }
        for name in &self.coded_fields {
            fields.push(Field::new(
                name,
                DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
                true,
            ));
        }
        Schema::new(fields)
    }

    fn row(&self, record: &TracedRecord) -> Result<ViewRow, AnalysisError> {
        let raw = self
            .raw_fields
            .iter()
            .map(|f| record.raw_text(f).map(str::to_string))
            .collect();
        let code_ids = self
            .coded_fields
            .iter()
            .map(|f| {
                record
                    .labels(f)
                    .map(|labels| labels.into_iter().map(|l| l.code_id).collect())
            })
            .collect::<Result<Vec<Vec<String>>, _>>()?;
        Ok(ViewRow {
            participant_uuid: record.participant_uuid.clone(),
            consent_withdrawn: record.is_consent_withdrawn(),
            raw,
            code_ids,
        })
    }
}

impl ViewRow {
    /// Fold a later message from the same participant into this row.
    fn absorb(&mut self, other: ViewRow) {
        self.consent_withdrawn |= other.consent_withdrawn;
        for (mine, theirs) in self.raw.iter_mut().zip(other.raw) {
            let Some(more) = theirs else { continue };
            match mine {
                Some(text) => {
                    text.push_str(RAW_JOIN);
                    text.push_str(&more);
                }
                None => *mine = Some(more),
            }
        }
        for (mine, theirs) in self.code_ids.iter_mut().zip(other.code_ids) {
            for id in theirs {
                if !mine.contains(&id) {
                    mine.push(id);
                }
            }
        }
    }
}

impl ColumnView {
    /// One row per record.
    pub fn messages(
        records: &[TracedRecord],
        columns: &[ColumnConfiguration],
    ) -> Result<Self, AnalysisError> {
        let layout = ViewLayout::new(columns);
        let rows = records
            .iter()
            .map(|r| layout.row(r))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rows(&layout, rows)
    }

    /// One row per participant, ordered by participant uuid.
    ///
    /// Consent counts as withdrawn if any of the participant's records withdrew it.
    pub fn participants(
        records: &[TracedRecord],
        columns: &[ColumnConfiguration],
    ) -> Result<Self, AnalysisError> {
        let layout = ViewLayout::new(columns);
        let mut by_uuid: BTreeMap<String, ViewRow> = BTreeMap::new();
        for record in records {
            let uuid = record.require_participant_uuid()?.to_string();
            let row = layout.row(record)?;
            match by_uuid.get_mut(&uuid) {
                Some(existing) => existing.absorb(row),
                None => {
                    by_uuid.insert(uuid, row);
                }
            }
        }
        Self::from_rows(&layout, by_uuid.into_values().collect())
    }

    fn from_rows(layout: &ViewLayout, rows: Vec<ViewRow>) -> Result<Self, AnalysisError> {
        let mut uuid_builder = StringBuilder::new();
        let mut consent_builder = BooleanBuilder::new();
        let mut raw_builders: Vec<StringBuilder> =
            layout.raw_fields.iter().map(|_| StringBuilder::new()).collect();
        let mut code_builders: Vec<ListBuilder<StringBuilder>> = layout
            .coded_fields
            .iter()
            .map(|_| ListBuilder::new(StringBuilder::new()))
            .collect();

        for row in &rows {
            uuid_builder.append_option(row.participant_uuid.as_deref());
            consent_builder.append_value(row.consent_withdrawn);
            for (builder, raw) in raw_builders.iter_mut().zip(&row.raw) {
                builder.append_option(raw.as_deref());
            }
            for (builder, ids) in code_builders.iter_mut().zip(&row.code_ids) {
                for id in ids {
                    builder.values().append_value(id);
                }
                builder.append(true);
            }
        }

        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(uuid_builder.finish()),
            Arc::new(consent_builder.finish()),
        ];
        columns.extend(
            raw_builders
                .iter_mut()
                .map(|b| Arc::new(b.finish()) as ArrayRef),
        );
        columns.extend(
            code_builders
                .iter_mut()
                .map(|b| Arc::new(b.finish()) as ArrayRef),
        );

        let batch = RecordBatch::try_new(Arc::new(layout.schema()), columns)?;
        Ok(Self { batch })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn participant_uuid(&self, row: usize) -> Option<&str> {
        let col = self.string_column(PARTICIPANT_UUID_KEY).ok()?;
        (!col.is_null(row)).then(|| col.value(row))
    }

    pub fn is_consent_withdrawn(
        &self,
        row: usize,
        consent_field: &str,
    ) -> Result<bool, AnalysisError> {
        let col = self
            .batch
            .column_by_name(consent_field)
            .and_then(|c| c.as_any().downcast_ref::<BooleanArray>())
            .ok_or_else(|| AnalysisError::MissingColumn(consent_field.to_string()))?;
        Ok(!col.is_null(row) && col.value(row))
    }

    /// Raw text under `raw_field`, if present and non-empty.
    pub fn raw(&self, row: usize, raw_field: &str) -> Result<Option<&str>, AnalysisError> {
        let col = self.string_column(raw_field)?;
        if col.is_null(row) {
            return Ok(None);
        }
        Ok(Some(col.value(row)).filter(|s| !s.is_empty()))
    }

    pub fn code_ids(&self, row: usize, coded_field: &str) -> Result<Vec<String>, AnalysisError> {
        let col = self
            .batch
            .column_by_name(coded_field)
            .and_then(|c| c.as_any().downcast_ref::<ListArray>())
            .ok_or_else(|| AnalysisError::MissingColumn(coded_field.to_string()))?;
        if col.is_null(row) {
            return Ok(Vec::new());
        }
        Ok(strings_from_array(col.value(row).as_ref()))
    }

    /// Codes of `column`'s scheme labelled on `row`.
    pub fn codes<'s>(
        &self,
        row: usize,
        column: &'s ColumnConfiguration,
    ) -> Result<Vec<&'s Code>, AnalysisError> {
        self.code_ids(row, &column.coded_field)?
            .iter()
            .map(|id| {
                column
                    .code_scheme
                    .get_code_with_code_id(id)
                    .map_err(AnalysisError::from)
            })
            .collect()
    }

    /// Per row: `None` if consent is withdrawn, otherwise the string values of
    /// the row's codes under `column`.
    pub fn opt_in_code_values<'s>(
        &self,
        consent_field: &str,
        column: &'s ColumnConfiguration,
    ) -> Result<Vec<Option<BTreeSet<&'s str>>>, AnalysisError> {
        (0..self.num_rows())
            .map(|row| -> Result<Option<BTreeSet<&'s str>>, AnalysisError> {
                if self.is_consent_withdrawn(row, consent_field)? {
                    return Ok(None);
                }
                let values = self
                    .codes(row, column)?
                    .into_iter()
                    .map(|c| c.string_value.as_str())
                    .collect();
                Ok(Some(values))
            })
            .collect()
    }

    fn string_column(&self, name: &str) -> Result<&StringArray, AnalysisError> {
        self.batch
            .column_by_name(name)
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))
    }
}

fn strings_from_array(arr: &dyn Array) -> Vec<String> {
    let mut out = Vec::with_capacity(arr.len());
    if let Some(a) = arr.as_any().downcast_ref::<StringArray>() {
        for i in 0..a.len() {
            if !a.is_null(i) {
                out.push(a.value(i).to_string());
            }
        }
    }
    out
}
