use serde::{Deserialize, Serialize};

/// One product to insert into an active order: search key, quantity and an
/// optional kitchen comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub comment: Option<String>,
}

impl LineItem {
    #[must_use]
    pub fn new(name: &str, quantity: u32) -> Self {
        LineItem {
            name: name.to_string(),
            quantity,
            comment: None,
        }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }
}

/// Identity document kind on the e-receipt form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// National identity card; what the form preselects.
    #[default]
    Dni,
    Ruc,
    ForeignerId,
    Passport,
}

impl DocumentType {
    /// Label as rendered in the POS document-type dropdown.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DocumentType::Dni => "DNI",
            DocumentType::Ruc => "RUC",
            DocumentType::ForeignerId => "CARNET DE EXTRANJERIA",
            DocumentType::Passport => "PASAPORTE",
        }
    }
}

/// Receipt kind, mapped to the single-letter codes the POS uses internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptType {
    #[default]
    Boleta,
    Factura,
    NotaVenta,
}

impl ReceiptType {
    /// Single-letter code carried by the POS radio group.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            ReceiptType::Boleta => "B",
            ReceiptType::Factura => "F",
            ReceiptType::NotaVenta => "N",
        }
    }

    /// Label as rendered next to the radio control.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ReceiptType::Boleta => "Boleta",
            ReceiptType::Factura => "Factura",
            ReceiptType::NotaVenta => "Nota de Venta",
        }
    }
}

/// E-receipt form contents. Filled but deliberately never submitted by the
/// automation core; the captured screenshot is the audit artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptData {
    pub document_type: DocumentType,
    pub document_number: String,
    pub full_name: String,
    pub address: String,
    pub observation: String,
    pub receipt_type: ReceiptType,
}

/// Outcome of a top-level write operation.
///
/// Steps and errors are accumulated rather than raised; callers map this to
/// transport status (success → OK, success with errors → client error,
/// unexpected fault → server error).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
    pub logs: Vec<String>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_count: Option<u32>,
    /// PNG capture of the final confirmation state, when one was taken.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "screenshot_b64"
    )]
    pub screenshot: Option<Vec<u8>>,
}

impl OperationResult {
    /// Records a human-readable step in the operation log.
    pub fn log(&mut self, step: impl Into<String>) {
        self.logs.push(step.into());
    }

    /// Records a non-fatal error; the operation keeps going.
    pub fn error(&mut self, err: impl Into<String>) {
        self.errors.push(err.into());
    }

    /// Marks the operation failed with a terminal message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        OperationResult {
            success: false,
            errors: vec![message.clone()],
            message,
            ..OperationResult::default()
        }
    }
}

/// Base64 (de)serialization for the optional screenshot bytes.
mod screenshot_b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_str(&STANDARD.encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            Some(s) => STANDARD
                .decode(s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_type_codes_are_single_letters() {
        assert_eq!(ReceiptType::Boleta.code(), "B");
        assert_eq!(ReceiptType::Factura.code(), "F");
        assert_eq!(ReceiptType::NotaVenta.code(), "N");
    }

    #[test]
    fn document_type_defaults_to_dni() {
        assert_eq!(DocumentType::default(), DocumentType::Dni);
    }

    #[test]
    fn operation_result_serializes_screenshot_as_base64() {
        let result = OperationResult {
            success: true,
            message: "ok".to_string(),
            logs: vec!["step".to_string()],
            errors: vec![],
            inserted_count: Some(2),
            screenshot: Some(vec![1, 2, 3]),
        };
        let json = serde_json::to_value(&result).expect("serializable");
        assert_eq!(json["screenshot"], "AQID");
        assert_eq!(json["inserted_count"], 2);

        let back: OperationResult = serde_json::from_value(json).expect("deserializable");
        assert_eq!(back.screenshot.as_deref(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn operation_result_omits_absent_screenshot() {
        let result = OperationResult::failed("login failed");
        let json = serde_json::to_value(&result).expect("serializable");
        assert!(json.get("screenshot").is_none());
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0], "login failed");
    }
}
