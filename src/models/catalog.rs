use serde::{ Serialize, Deserialize };

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: String,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), object: "model".to_string() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelList {
    pub data: Vec<ModelInfo>,
}

impl ModelList {
    pub fn from_ids<I, S>(ids: I) -> Self
        where I: IntoIterator<Item = S>, S: Into<String>
    {
        Self { data: ids.into_iter().map(ModelInfo::new).collect() }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.data.iter().map(|m| m.id.as_str()).collect()
    }
}
