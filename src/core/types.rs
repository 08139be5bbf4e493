use serde::{Deserialize, Serialize};

use crate::core::error::{CodecError, SchemaError, ValidationError};
use crate::proto::schema::{self as wire, DataType};

/// One entity as supplied by the application: field name to value
pub type Row = serde_json::Map<String, serde_json::Value>;

/// One entity decoded from a query response
pub type QueryResultRow = serde_json::Map<String, serde_json::Value>;

/// Field types the codec can put on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    VarChar,
    Json,
    BinaryVector,
    FloatVector,
}

impl FieldType {
    pub fn is_vector(&self) -> bool {
        matches!(self, FieldType::BinaryVector | FieldType::FloatVector)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            FieldType::Bool => DataType::Bool,
            FieldType::Int8 => DataType::Int8,
            FieldType::Int16 => DataType::Int16,
            FieldType::Int32 => DataType::Int32,
            FieldType::Int64 => DataType::Int64,
            FieldType::Float => DataType::Float,
            FieldType::Double => DataType::Double,
            FieldType::VarChar => DataType::VarChar,
            FieldType::Json => DataType::Json,
            FieldType::BinaryVector => DataType::BinaryVector,
            FieldType::FloatVector => DataType::FloatVector,
        }
    }

    /// Wire column key the field's values are carried under
    pub fn wire_key(&self) -> WireKey {
        match self {
            FieldType::Bool => WireKey::BoolData,
            FieldType::Int8 | FieldType::Int16 | FieldType::Int32 => WireKey::IntData,
            FieldType::Int64 => WireKey::LongData,
            FieldType::Float => WireKey::FloatData,
            FieldType::Double => WireKey::DoubleData,
            FieldType::VarChar => WireKey::StringData,
            FieldType::Json => WireKey::JsonData,
            FieldType::BinaryVector => WireKey::BinaryVector,
            FieldType::FloatVector => WireKey::FloatVector,
        }
    }
}

impl TryFrom<DataType> for FieldType {
    type Error = ValidationError;

    fn try_from(data_type: DataType) -> Result<Self, Self::Error> {
        match data_type {
            DataType::Bool => Ok(FieldType::Bool),
            DataType::Int8 => Ok(FieldType::Int8),
            DataType::Int16 => Ok(FieldType::Int16),
            DataType::Int32 => Ok(FieldType::Int32),
            DataType::Int64 => Ok(FieldType::Int64),
            DataType::Float => Ok(FieldType::Float),
            DataType::Double => Ok(FieldType::Double),
            DataType::VarChar => Ok(FieldType::VarChar),
            DataType::Json => Ok(FieldType::Json),
            DataType::BinaryVector => Ok(FieldType::BinaryVector),
            DataType::FloatVector => Ok(FieldType::FloatVector),
            DataType::None | DataType::String | DataType::Array => {
                Err(ValidationError::UnsupportedType(format!("{:?}", data_type)))
            }
        }
    }
}

impl TryFrom<i32> for FieldType {
    type Error = ValidationError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        let data_type = DataType::try_from(raw)
            .map_err(|_| ValidationError::UnsupportedType(format!("data type {}", raw)))?;
        FieldType::try_from(data_type)
    }
}

/// Column keys of the wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireKey {
    BoolData,
    IntData,
    LongData,
    FloatData,
    DoubleData,
    StringData,
    JsonData,
    BinaryVector,
    FloatVector,
}

impl WireKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireKey::BoolData => "bool_data",
            WireKey::IntData => "int_data",
            WireKey::LongData => "long_data",
            WireKey::FloatData => "float_data",
            WireKey::DoubleData => "double_data",
            WireKey::StringData => "string_data",
            WireKey::JsonData => "json_data",
            WireKey::BinaryVector => "binary_vector",
            WireKey::FloatVector => "float_vector",
        }
    }
}

/// Field description as returned by the collection-management calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub field_type: FieldType,
    /// Elements for float vectors, bits for binary vectors
    #[serde(default)]
    pub dimension: Option<u32>,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub auto_id: bool,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            dimension: None,
            is_primary_key: false,
            auto_id: false,
        }
    }

    pub fn vector(name: impl Into<String>, field_type: FieldType, dimension: u32) -> Self {
        Self {
            dimension: Some(dimension),
            ..Self::new(name, field_type)
        }
    }

    pub fn primary_key(mut self, auto_id: bool) -> Self {
        self.is_primary_key = true;
        self.auto_id = auto_id;
        self
    }
}

impl TryFrom<&wire::FieldSchema> for FieldSchema {
    type Error = CodecError;

    fn try_from(field: &wire::FieldSchema) -> Result<Self, Self::Error> {
        let field_type = FieldType::try_from(field.data_type)?;
        let dimension = match field.type_params.iter().find(|p| p.key == "dim") {
            Some(param) => Some(param.value.trim().parse::<u32>().map_err(|_| {
                SchemaError::InvalidDimension {
                    field: field.name.clone(),
                    value: param.value.clone(),
                }
            })?),
            None => None,
        };

        Ok(Self {
            name: field.name.clone(),
            field_type,
            dimension,
            is_primary_key: field.is_primary_key,
            auto_id: field.auto_id,
        })
    }
}

/// Primary key of a search hit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Str(String),
}

/// One hit of a similarity search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResultRow {
    pub score: f64,
    pub id: RowId,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
    /// Query vector this hit answers
    #[serde(skip)]
    pub query_index: usize,
    /// Position within that query's top-k
    #[serde(skip)]
    pub rank: usize,
}
