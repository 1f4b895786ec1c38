#![allow(dead_code)]

use pos_service::config::{
    BusinessConfig, Config, DatabaseConfig, ServerConfig, WhatsappConfig,
};
use pos_service::Application;
use secrecy::Secret;
use serde_json::{json, Value};

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: mongodb::Database,
    pub db_name: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_whatsapp(WhatsappConfig {
            enabled: false,
            api_url: "http://127.0.0.1:9".to_string(),
            token: Secret::new(String::new()),
            phone_number_id: String::new(),
        })
        .await
    }

    pub async fn spawn_with_whatsapp(whatsapp: WhatsappConfig) -> Self {
        let db_name = format!("pos_test_{}", uuid::Uuid::new_v4());

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            database: DatabaseConfig {
                url: Secret::new(
                    std::env::var("TEST_MONGODB_URI")
                        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
                ),
                db_name: db_name.clone(),
            },
            business: BusinessConfig {
                name: "Test Store".to_string(),
                public_url: "http://localhost:4000".to_string(),
                currency: "INR".to_string(),
            },
            whatsapp,
            service_name: "pos-service-test".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);
        let db = app.db().clone();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("http://127.0.0.1:{}/health", port);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            db,
            db_name,
            client,
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute GET request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute POST request")
    }

    pub async fn patch(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .patch(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute PATCH request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute DELETE request")
    }

    pub async fn delete_with_body(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute DELETE request")
    }

    /// Seed a product through the API; returns its id.
    pub async fn seed_product(
        &self,
        name: &str,
        selling_price: f64,
        tax_percent: f64,
        quantity: i64,
    ) -> String {
        let response = self
            .post(
                "/products",
                &json!({
                    "name": name,
                    "selling_price": selling_price,
                    "tax_percent": tax_percent,
                    "quantity": quantity,
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201, "Failed to seed product");
        let body: Value = response.json().await.expect("Invalid product JSON");
        body["id"].as_str().expect("Product id missing").to_string()
    }

    /// Seed a customer keyed on phone; returns the response body.
    pub async fn seed_customer(&self, name: &str, phone: &str) -> Value {
        let response = self
            .post("/customers", &json!({ "name": name, "phone": phone }))
            .await;
        assert_eq!(response.status().as_u16(), 201, "Failed to seed customer");
        response.json().await.expect("Invalid customer JSON")
    }

    /// Create a single-line invoice for a phone customer; returns the body.
    pub async fn create_invoice(
        &self,
        phone: &str,
        product_id: &str,
        qty: i64,
        unit_price: f64,
    ) -> Value {
        let response = self
            .post(
                "/invoices",
                &json!({
                    "customer_name": "Test Customer",
                    "customer_phone": phone,
                    "items": [{
                        "product_id": product_id,
                        "qty": qty,
                        "unit_price": unit_price,
                    }],
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201, "Failed to create invoice");
        response.json().await.expect("Invalid invoice JSON")
    }

    /// The customer's rolling due, as reported by the API.
    pub async fn due_for(&self, phone: &str) -> f64 {
        let response = self.get(&format!("/invoices/due?phone={}", phone)).await;
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.expect("Invalid due JSON");
        body["due"].as_f64().expect("due missing")
    }

    /// Cleanup test database after test completes.
    pub async fn cleanup(&self) {
        self.db
            .drop(None)
            .await
            .expect("Failed to drop test database");
    }
}
