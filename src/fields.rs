//! Tolerant field access for deal records.
//!
//! The local store speaks camelCase English (`clientName`, `negotiatedValue`);
//! the webhook source answers with its own spellings, camelCase Portuguese
//! (`nomeCliente`, `valorNegociado`) or column names (`Nome_cliente`,
//! `valor_negociado`, `estagio`, `vendedor`). Every read of a raw record goes
//! through [`resolve_field`] / [`resolve`] so all of them land on the same
//! logical field.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::types::{Deal, DealPatch, Origin};

/// A logical field and every name it may arrive under, in lookup order.
///
/// The first name is the local camelCase spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldKey {
    pub names: &'static [&'static str],
}

impl FieldKey {
    pub const fn new(names: &'static [&'static str]) -> Self {
        Self { names }
    }

    pub const fn primary(&self) -> &'static str {
        self.names[0]
    }
}

pub const ID: FieldKey = FieldKey::new(&["id"]);
pub const CLIENT_NAME: FieldKey = FieldKey::new(&["clientName", "nomeCliente", "Nome_cliente"]);
pub const NEGOTIATED_VALUE: FieldKey =
    FieldKey::new(&["negotiatedValue", "valorNegociado", "valor_negociado"]);
pub const STAGE: FieldKey = FieldKey::new(&["stage", "estagio"]);
pub const STATUS: FieldKey = FieldKey::new(&["status"]);
pub const OWNER: FieldKey = FieldKey::new(&["owner", "vendedor"]);
pub const CONVERSATION_LINK: FieldKey = FieldKey::new(&["conversationLink", "link_conversa"]);
pub const CONVERSATION_SUMMARY: FieldKey = FieldKey::new(&["conversationSummary", "resumo"]);
pub const CREATED_AT: FieldKey = FieldKey::new(&["createdAt", "dataCriacao"]);
pub const UPDATED_AT: FieldKey =
    FieldKey::new(&["updatedAt", "dataModificacao", "dataUltimaModificacao"]);
pub const ORIGIN: FieldKey = FieldKey::new(&["origin"]);

/// Only the local store stamps this exact name; untagged records carrying it
/// are local.
const LOCAL_MARKER: &str = "createdAt";

pub const TOTAL_VALUE_IN_PROGRESS: FieldKey =
    FieldKey::new(&["totalValueInProgress", "valorTotalEmAndamento"]);
pub const OPEN_DEALS_COUNT: FieldKey = FieldKey::new(&["openDealsCount", "numeroNegociosAbertos"]);
pub const WIN_RATE: FieldKey = FieldKey::new(&["winRate", "taxaDeGanho"]);
pub const DEALS_BY_STAGE: FieldKey = FieldKey::new(&["dealsByStage", "negociosPorEstagio"]);
pub const VALUE_BY_SELLER: FieldKey = FieldKey::new(&["valueBySeller", "valorPorVendedor"]);

/// Conversion from a raw JSON value into a typed field.
pub trait FieldValue: Sized {
    fn from_field(value: &Value) -> Option<Self>;
}

impl FieldValue for String {
    fn from_field(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl FieldValue for f64 {
    fn from_field(value: &Value) -> Option<Self> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_amount(s),
            _ => None,
        };
        parsed.filter(|v| v.is_finite())
    }
}

impl FieldValue for i64 {
    fn from_field(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FieldValue for DateTime<Utc> {
    fn from_field(value: &Value) -> Option<Self> {
        let raw = value.as_str()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
            .map(|naive| naive.and_utc())
            .ok()
    }
}

/// Parse an amount that arrived as text ("1200", " 1200.50 ", "1200,50").
fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    trimmed.parse::<f64>().ok().or_else(|| {
        if trimmed.contains(',') && !trimmed.contains('.') {
            trimmed.replace(',', ".").parse::<f64>().ok()
        } else {
            None
        }
    })
}

/// A value counts as present unless it is missing, `null`, or a blank string.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// First present value under `primary`, then under `alternate`.
pub fn lookup<'a>(record: &'a Map<String, Value>, primary: &str, alternate: &str) -> Option<&'a Value> {
    present(record, primary).or_else(|| present(record, alternate))
}

/// First present value under any of `key`'s names.
pub fn lookup_key<'a>(record: &'a Map<String, Value>, key: FieldKey) -> Option<&'a Value> {
    key.names.iter().find_map(|name| present(record, name))
}

fn present<'a>(record: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    record.get(name).filter(|v| is_present(v))
}

fn convert_or_default<T: FieldValue>(value: Option<&Value>, label: &str, default: T) -> T {
    match value {
        Some(value) => T::from_field(value).unwrap_or_else(|| {
            log::warn!(
                "Field {} holds an unusable value {}; using default",
                label,
                value
            );
            default
        }),
        None => default,
    }
}

/// Resolve a logical field: `primary` wins when present, `alternate` otherwise,
/// `default` when neither is present or the present value cannot be converted.
pub fn resolve_field<T: FieldValue>(
    record: &Map<String, Value>,
    primary: &str,
    alternate: &str,
    default: T,
) -> T {
    convert_or_default(
        lookup(record, primary, alternate),
        &format!("{}/{}", primary, alternate),
        default,
    )
}

/// Resolve an optional field. Unconvertible values count as absent.
pub fn resolve_optional<T: FieldValue>(record: &Map<String, Value>, key: FieldKey) -> Option<T> {
    lookup_key(record, key).and_then(T::from_field)
}

/// [`resolve_field`] over every spelling of `key`, in order.
pub fn resolve<T: FieldValue>(record: &Map<String, Value>, key: FieldKey, default: T) -> T {
    convert_or_default(lookup_key(record, key), &key.names.join("/"), default)
}

/// Decide where a raw record came from.
///
/// An explicit `origin` tag wins. Untagged records are local exactly when they
/// carry `createdAt`; the webhook source never sends that field.
pub fn detect_origin(record: &Map<String, Value>) -> Origin {
    match lookup_key(record, ORIGIN).and_then(Value::as_str) {
        Some("local") => Origin::Local,
        Some("remote") => Origin::Remote,
        _ if present(record, LOCAL_MARKER).is_some() => Origin::Local,
        _ => Origin::Remote,
    }
}

/// Normalize a raw record from either naming scheme into a [`Deal`].
///
/// Fails only when the record has no usable `id`.
pub fn normalize_record(record: &Map<String, Value>) -> Result<Deal, String> {
    let id: i64 = resolve_optional(record, ID)
        .ok_or_else(|| format!("record without a usable id: {}", Value::Object(record.clone())))?;

    Ok(Deal {
        id,
        client_name: resolve(record, CLIENT_NAME, String::new()),
        negotiated_value: resolve(record, NEGOTIATED_VALUE, 0.0),
        stage: resolve(record, STAGE, String::new()),
        status: resolve(record, STATUS, String::new()),
        owner: resolve(record, OWNER, String::new()),
        created_at: resolve_optional(record, CREATED_AT),
        updated_at: resolve_optional(record, UPDATED_AT),
        conversation_link: resolve_optional(record, CONVERSATION_LINK),
        conversation_summary: resolve_optional(record, CONVERSATION_SUMMARY),
        origin: detect_origin(record),
    })
}

/// Read a partial update out of a raw request body under either naming scheme.
///
/// Absent fields stay `None`. A present field that cannot be converted is an
/// error naming the field, so a bad value is never silently dropped.
pub fn patch_from_record(record: &Map<String, Value>) -> Result<DealPatch, String> {
    fn take<T: FieldValue>(record: &Map<String, Value>, key: FieldKey) -> Result<Option<T>, String> {
        match lookup_key(record, key) {
            None => Ok(None),
            Some(value) => T::from_field(value)
                .map(Some)
                .ok_or_else(|| format!("{} has an invalid value: {}", key.primary(), value)),
        }
    }

    // A blank string is an explicit clear; `null` stays "not sent".
    fn take_clearable(record: &Map<String, Value>, key: FieldKey) -> Result<Option<String>, String> {
        if let Some(value) = take(record, key)? {
            return Ok(Some(value));
        }
        let blank = key
            .names
            .iter()
            .any(|name| matches!(record.get(*name), Some(Value::String(_))));
        Ok(blank.then(String::new))
    }

    Ok(DealPatch {
        client_name: take(record, CLIENT_NAME)?,
        negotiated_value: take(record, NEGOTIATED_VALUE)?,
        stage: take(record, STAGE)?,
        status: take(record, STATUS)?,
        owner: take(record, OWNER)?,
        conversation_link: take_clearable(record, CONVERSATION_LINK)?,
        conversation_summary: take_clearable(record, CONVERSATION_SUMMARY)?,
    })
}

fn write_all(body: &mut Map<String, Value>, key: FieldKey, value: Value) {
    for name in key.names {
        body.insert(name.to_string(), value.clone());
    }
}

/// Build the webhook write body: `id` plus every present patch field under
/// each of its spellings.
pub fn dual_named_body(id: i64, patch: &DealPatch) -> Value {
    let mut body = Map::new();
    body.insert(ID.primary().to_string(), Value::from(id));
    if let Some(v) = &patch.client_name {
        write_all(&mut body, CLIENT_NAME, Value::from(v.as_str()));
    }
    if let Some(v) = patch.negotiated_value {
        write_all(&mut body, NEGOTIATED_VALUE, Value::from(v));
    }
    if let Some(v) = &patch.stage {
        write_all(&mut body, STAGE, Value::from(v.as_str()));
    }
    if let Some(v) = &patch.status {
        write_all(&mut body, STATUS, Value::from(v.as_str()));
    }
    if let Some(v) = &patch.owner {
        write_all(&mut body, OWNER, Value::from(v.as_str()));
    }
    if let Some(v) = &patch.conversation_link {
        write_all(&mut body, CONVERSATION_LINK, Value::from(v.as_str()));
    }
    if let Some(v) = &patch.conversation_summary {
        write_all(&mut body, CONVERSATION_SUMMARY, Value::from(v.as_str()));
    }
    Value::Object(body)
}

/// Serde hook: accept an amount as a JSON number or numeric string.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    f64::from_field(&value).ok_or_else(|| {
        serde::de::Error::custom(format!("negotiatedValue must be numeric, got {}", value))
    })
}

/// Serde hook for optional amounts; `null` reads as absent.
pub fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    f64::from_field(&value).map(Some).ok_or_else(|| {
        serde::de::Error::custom(format!("negotiatedValue must be numeric, got {}", value))
    })
}
