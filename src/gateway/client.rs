use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::AppError;

use super::mock;

/// Paths probed for the PIX copy-paste code in gateway responses; the
/// gateway is not consistent about where it puts it. First match wins.
pub const PIX_CODE_PATHS: &[&[&str]] = &[
    &["pix", "qrcode"],
    &["pix", "qrCode"],
    &["pix", "code"],
    &["qrcode"],
    &["qrCode"],
    &["code"],
];

/// Gateway vocabulary treated as settled when polling a charge directly.
const GATEWAY_PAID_STATUSES: &[&str] = &["paid", "approved"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddress {
    pub street: Option<String>,
    pub street_number: Option<String>,
    pub complement: Option<String>,
    pub zip_code: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChargeItem {
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// Major currency units as received from the checkout form.
    pub amount: f64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_document: String,
    pub customer_phone: String,
    pub address: Option<CustomerAddress>,
    pub items: Vec<ChargeItem>,
    pub product_name: String,
}

#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    pub transaction_id: String,
    pub pix_code: String,
    pub qr_code_url: String,
    pub expires_at: String,
    pub is_mock: bool,
}

#[derive(Debug, Clone)]
pub struct ChargeDetails {
    pub transaction_id: String,
    pub pix_code: String,
    pub qr_code_url: String,
    pub status: String,
}

/// Client for the PIX gateway's transactions API, Basic-auth with the
/// server-held secret as username and an empty password.
///
/// The underlying HTTP client intentionally carries no timeout: the
/// upstream behavior is preserved as-is and the gap is documented rather
/// than silently fixed.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    secret_key: Option<String>,
    company_id: Option<String>,
    qr_service_url: String,
}

impl GatewayClient {
    pub fn new(
        base_url: String,
        secret_key: Option<String>,
        company_id: Option<String>,
        qr_service_url: String,
    ) -> Self {
        GatewayClient {
            client: Client::new(),
            base_url,
            secret_key,
            company_id,
            qr_service_url,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some() && self.company_id.is_some()
    }

    fn auth_header(&self) -> String {
        let secret = self.secret_key.as_deref().unwrap_or_default();
        format!("Basic {}", BASE64.encode(format!("{secret}:")))
    }

    fn transactions_url(&self) -> String {
        format!("{}/transactions", self.base_url.trim_end_matches('/'))
    }

    /// Creates a PIX charge. Document validation happens before anything
    /// leaves the process; without credentials the mock fallback keeps the
    /// rest of the pipeline exercised.
    pub async fn create_charge(&self, req: &ChargeRequest) -> Result<ChargeOutcome, AppError> {
        let document = mock::clean_document(&req.customer_document);
        if document.len() != 11 {
            return Err(AppError::Validation(
                "Invalid CPF: document must have 11 digits".to_string(),
            ));
        }

        if !self.is_configured() {
            tracing::warn!("gateway credentials not configured, issuing mock PIX charge");
            return Ok(self.mock_charge(req));
        }

        let body = self.build_charge_body(req, &document);
        tracing::info!(amount = req.amount, "creating PIX charge at gateway");

        let response = self
            .client
            .post(self.transactions_url())
            .header(AUTHORIZATION, self.auth_header())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                status: 502,
                body: e.to_string(),
            })?;

        let http_status = response.status().as_u16();
        let raw = response.text().await.map_err(|e| AppError::Upstream {
            status: 502,
            body: e.to_string(),
        })?;

        let data: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(_) => {
                tracing::error!(http_status, body = %raw, "gateway returned non-JSON body");
                return Err(AppError::Upstream {
                    status: http_status,
                    body: raw,
                });
            }
        };

        let transaction_id = stringify(&data["id"]);
        let refused = data["status"].as_str() == Some("refused");
        let pix_code = extract_pix_code(&data);

        if refused {
            let reason = data["refusedReason"]["description"]
                .as_str()
                .unwrap_or("Transaction validation failed")
                .to_string();
            let code = data["refusedReason"]["acquirerCode"]
                .as_str()
                .map(str::to_string);

            match &pix_code {
                // Gateway quirk: a refused charge sometimes still carries a
                // usable PIX code. The customer gets the code anyway.
                Some(_) => {
                    tracing::warn!(
                        transaction_id = %transaction_id.clone().unwrap_or_default(),
                        %reason,
                        "charge refused but PIX code present, returning it"
                    );
                }
                None => {
                    tracing::error!(%reason, ?code, "charge refused by gateway");
                    return Err(AppError::ChargeRefused {
                        reason,
                        code,
                        transaction_id,
                    });
                }
            }
        }

        let Some(pix_code) = pix_code else {
            tracing::error!(http_status, body = %raw, "PIX code missing from gateway response");
            return Err(AppError::Upstream {
                status: 500,
                body: format!(
                    "PIX code not found in gateway response (status {})",
                    data["status"].as_str().unwrap_or("unknown")
                ),
            });
        };

        let transaction_id = transaction_id.ok_or_else(|| AppError::Upstream {
            status: 500,
            body: "gateway response carries no transaction id".to_string(),
        })?;

        let expires_at = data["pix"]["expirationDate"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| (Utc::now() + ChronoDuration::hours(1)).to_rfc3339());

        tracing::info!(%transaction_id, "PIX charge created");

        Ok(ChargeOutcome {
            qr_code_url: mock::qr_image_url(&self.qr_service_url, &pix_code),
            transaction_id,
            pix_code,
            expires_at,
            is_mock: false,
        })
    }

    /// Fetches a charge and extracts its PIX payload for re-display.
    pub async fn fetch_charge(&self, transaction_id: &str) -> Result<ChargeDetails, AppError> {
        let data = self.fetch_raw(transaction_id).await?;

        let pix_code = extract_pix_code(&data).ok_or_else(|| {
            AppError::NotFound("PIX code not found in transaction".to_string())
        })?;

        Ok(ChargeDetails {
            transaction_id: stringify(&data["id"]).unwrap_or_else(|| transaction_id.to_string()),
            qr_code_url: mock::qr_image_url(&self.qr_service_url, &pix_code),
            pix_code,
            status: extract_gateway_status(&data).unwrap_or("pending").to_string(),
        })
    }

    /// Polls a charge directly at the gateway and reports whether its
    /// status maps to paid.
    pub async fn charge_is_paid(&self, transaction_id: &str) -> Result<bool, AppError> {
        let data = self.fetch_raw(transaction_id).await?;
        let status = extract_gateway_status(&data).unwrap_or_default();
        Ok(GATEWAY_PAID_STATUSES.contains(&status))
    }

    async fn fetch_raw(&self, transaction_id: &str) -> Result<Value, AppError> {
        if !self.is_configured() {
            return Err(AppError::Config(
                "gateway credentials not configured".to_string(),
            ));
        }

        let url = format!("{}/{}", self.transactions_url(), transaction_id);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                status: 502,
                body: e.to_string(),
            })?;

        let http_status = response.status().as_u16();
        let raw = response.text().await.map_err(|e| AppError::Upstream {
            status: 502,
            body: e.to_string(),
        })?;

        if !(200..300).contains(&http_status) {
            return Err(AppError::Upstream {
                status: http_status,
                body: raw,
            });
        }

        serde_json::from_str(&raw).map_err(|_| AppError::Upstream {
            status: http_status,
            body: raw,
        })
    }

    fn mock_charge(&self, req: &ChargeRequest) -> ChargeOutcome {
        let pix_code = mock::mock_pix_code(req.amount, &req.customer_name);

        ChargeOutcome {
            transaction_id: mock::mock_transaction_id(),
            qr_code_url: mock::qr_image_url(&self.qr_service_url, &pix_code),
            pix_code,
            expires_at: (Utc::now() + ChronoDuration::hours(1)).to_rfc3339(),
            is_mock: true,
        }
    }

    fn build_charge_body(&self, req: &ChargeRequest, document: &str) -> Value {
        let mut customer = json!({
            "name": req.customer_name,
            "email": req.customer_email,
            "phone": req.customer_phone,
            "document": {
                "number": document,
                "type": "CPF",
            },
        });

        if let Some(address) = &req.address {
            customer["address"] = normalize_address(address);
        }

        let items: Vec<Value> = if req.items.is_empty() {
            vec![json!({
                "name": req.product_name,
                "quantity": 1,
                "price": to_minor_units(req.amount),
            })]
        } else {
            req.items
                .iter()
                .map(|item| {
                    json!({
                        "name": item.name.clone().unwrap_or_else(|| req.product_name.clone()),
                        "quantity": item.quantity.unwrap_or(1),
                        "price": to_minor_units(item.price.unwrap_or(req.amount)),
                    })
                })
                .collect()
        };

        json!({
            "amount": to_minor_units(req.amount),
            "paymentMethod": "pix",
            "customer": customer,
            "items": items,
        })
    }
}

fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Address block formatted the way the gateway expects: trimmed fields,
/// digits-only zip, uppercase state, empty optionals dropped.
fn normalize_address(address: &CustomerAddress) -> Value {
    let field = |value: &Option<String>| value.as_deref().unwrap_or("").trim().to_string();

    let mut street_number = field(&address.street_number);
    if street_number.is_empty() {
        street_number = "S/N".to_string();
    }
    let mut country = field(&address.country);
    if country.is_empty() {
        country = "BR".to_string();
    }

    let mut out = json!({
        "street": field(&address.street),
        "streetNumber": street_number,
        "zipCode": mock::clean_document(&field(&address.zip_code)),
        "neighborhood": field(&address.neighborhood),
        "city": field(&address.city),
        "state": field(&address.state).to_uppercase(),
        "country": country,
    });

    let complement = field(&address.complement);
    if !complement.is_empty() {
        out["complement"] = json!(complement);
    }

    out
}

pub fn extract_pix_code(data: &Value) -> Option<String> {
    for path in PIX_CODE_PATHS {
        let mut node = data;
        for segment in *path {
            node = &node[*segment];
        }
        if let Some(code) = node.as_str().map(str::trim).filter(|s| !s.is_empty()) {
            return Some(code.to_string());
        }
    }
    None
}

fn extract_gateway_status(data: &Value) -> Option<&str> {
    data["status"]
        .as_str()
        .or_else(|| data["data"]["status"].as_str())
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
