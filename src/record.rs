use serde_json::{Map, Value};

/// A flat tabular record: an opaque field map plus a marker set when the
/// record was synthesized by threshold aggregation.
#[derive(Clone, Debug, Default)]
pub struct Record {
    pub fields: Map<String, Value>,
    pub aggregate: Option<AggregateMeta>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AggregateMeta {
    /// Threshold fraction in effect when the source records were merged.
    pub threshold: f64,
    /// Number of original records merged into this one.
    pub merged: usize,
}

impl Record {
    /// Accepts any JSON object; everything else is not a record.
    pub fn from_value(value: Value) -> Option<Record> {
        match value {
            Value::Object(fields) => Some(Record {
                fields,
                aggregate: None,
            }),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn is_aggregate(&self) -> bool {
        self.aggregate.is_some()
    }

    /// JSON form handed downstream. Aggregates carry the two flag fields in
    /// addition to their merged data.
    pub fn to_value(&self) -> Value {
        let mut fields = self.fields.clone();
        if let Some(meta) = &self.aggregate {
            fields.insert("_is_aggregation".to_string(), Value::Bool(true));
            fields.insert("_threshold".to_string(), Value::from(meta.threshold));
        }
        Value::Object(fields)
    }
}

pub type KeyFn = Box<dyn Fn(&Record) -> String + Send + Sync>;
pub type WeightFn = Box<dyn Fn(&Record) -> f64 + Send + Sync>;
pub type ThresholdFn = Box<dyn Fn(&[&Record]) -> f64 + Send + Sync>;

/// Group key accessor reading a named field. Non-string values are
/// stringified so numeric group keys still bucket correctly.
pub fn field_key(name: &str) -> KeyFn {
    let name = name.to_string();
    Box::new(move |record: &Record| match record.get(&name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}

/// Weight accessor reading a named field; missing or non-numeric reads as 0.
pub fn field_weight(name: &str) -> WeightFn {
    let name = name.to_string();
    Box::new(move |record: &Record| record.number(&name).unwrap_or(0.0))
}

pub fn fixed_threshold(fraction: f64) -> ThresholdFn {
    Box::new(move |_records: &[&Record]| fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(Record::from_value(json!([1, 2])).is_none());
        assert!(Record::from_value(json!("flat")).is_none());
        assert!(Record::from_value(json!({"k": "a"})).is_some());
    }

    #[test]
    fn to_value_stamps_aggregate_flags() {
        let mut record = Record::from_value(json!({"v": 11.0})).unwrap();
        record.aggregate = Some(AggregateMeta {
            threshold: 0.5,
            merged: 2,
        });
        let value = record.to_value();
        assert_eq!(value["_is_aggregation"], json!(true));
        assert_eq!(value["_threshold"], json!(0.5));
        assert_eq!(value["v"], json!(11.0));
    }

    #[test]
    fn plain_record_has_no_flags() {
        let record = Record::from_value(json!({"v": 1})).unwrap();
        let value = record.to_value();
        assert!(value.get("_is_aggregation").is_none());
        assert!(value.get("_threshold").is_none());
    }

    #[test]
    fn field_key_stringifies_non_strings() {
        let key = field_key("k");
        let record = Record::from_value(json!({"k": 42})).unwrap();
        assert_eq!(key(&record), "42");
        let record = Record::from_value(json!({"k": "east"})).unwrap();
        assert_eq!(key(&record), "east");
        let record = Record::from_value(json!({})).unwrap();
        assert_eq!(key(&record), "");
    }

    #[test]
    fn field_weight_defaults_to_zero() {
        let weight = field_weight("v");
        let record = Record::from_value(json!({"v": "not a number"})).unwrap();
        assert_eq!(weight(&record), 0.0);
        let record = Record::from_value(json!({"v": 2.5})).unwrap();
        assert_eq!(weight(&record), 2.5);
    }
}
