use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub business: BusinessConfig,
    pub whatsapp: WhatsappConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

/// Shop identity stamped on outbound notifications and invoice links.
#[derive(Deserialize, Clone, Debug)]
pub struct BusinessConfig {
    pub name: String,
    pub public_url: String,
    pub currency: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct WhatsappConfig {
    pub enabled: bool,
    pub api_url: String,
    pub token: Secret<String>,
    pub phone_number_id: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("POS_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("POS_SERVICE_PORT")
            .unwrap_or_else(|_| "4000".to_string())
            .parse()?;

        let db_url = env::var("POS_DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let db_name = env::var("POS_DATABASE_NAME").unwrap_or_else(|_| "pos_db".to_string());

        let business_name = env::var("BUSINESS_NAME").unwrap_or_else(|_| "Invoice".to_string());
        let public_url = env::var("SERVER_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));
        let currency = env::var("CURRENCY").unwrap_or_else(|_| "INR".to_string());

        let whatsapp_token = env::var("WHATSAPP_TOKEN").unwrap_or_default();
        let whatsapp_phone_number_id = env::var("WHATSAPP_PHONE_NUMBER_ID").unwrap_or_default();
        // Notification delivery needs both credentials; otherwise it stays off.
        let whatsapp_enabled = env::var("WHATSAPP_ENABLED")
            .map(|v| v.parse().unwrap_or(false))
            .unwrap_or(!whatsapp_token.is_empty() && !whatsapp_phone_number_id.is_empty());
        let whatsapp_api_url = env::var("WHATSAPP_API_URL")
            .unwrap_or_else(|_| "https://graph.facebook.com/v17.0".to_string());

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                db_name,
            },
            business: BusinessConfig {
                name: business_name,
                public_url,
                currency,
            },
            whatsapp: WhatsappConfig {
                enabled: whatsapp_enabled,
                api_url: whatsapp_api_url,
                token: Secret::new(whatsapp_token),
                phone_number_id: whatsapp_phone_number_id,
            },
            service_name: "pos-service".to_string(),
        })
    }
}
