// Resource operations
// Thin wrappers fixing the uri template and verb for each resource

use reqwest::Method;
use serde_json::{json, Value};

use crate::client::{Auth, MpClient, PAYMENT_METHODS_PATH};
use crate::error::Result;
use crate::rest_client::RequestResult;

impl MpClient {
    pub async fn get_payment(&self, id: &str) -> Result<RequestResult> {
        self.get(&format!("/v1/payments/{}", id), &[], true).await
    }

    pub async fn get_authorized_payment(&self, id: &str) -> Result<RequestResult> {
        self.get(&format!("/authorized_payments/{}", id), &[], true)
            .await
    }

    /// Refund an accredited payment in full
    pub async fn refund_payment(&self, id: &str) -> Result<RequestResult> {
        self.dispatch(
            Method::POST,
            &format!("/v1/payments/{}/refunds", id),
            &[],
            Some(&json!({})),
            Auth::Bearer,
        )
        .await
    }

    pub async fn get_payment_methods(&self) -> Result<RequestResult> {
        self.get(PAYMENT_METHODS_PATH, &[], true).await
    }

    /// Create a checkout preference; carries integration metadata headers
    pub async fn create_preference(&self, preference: &Value) -> Result<RequestResult> {
        self.post("/checkout/preferences", preference, &[]).await
    }

    pub async fn update_preference(&self, id: &str, preference: &Value) -> Result<RequestResult> {
        self.put(&format!("/checkout/preferences/{}", id), preference, &[])
            .await
    }

    pub async fn get_preference(&self, id: &str) -> Result<RequestResult> {
        self.get(&format!("/checkout/preferences/{}", id), &[], true)
            .await
    }

    pub async fn create_preapproval_payment(&self, preapproval: &Value) -> Result<RequestResult> {
        self.dispatch(
            Method::POST,
            "/preapproval",
            &[],
            Some(preapproval),
            Auth::Bearer,
        )
        .await
    }

    pub async fn get_preapproval_payment(&self, id: &str) -> Result<RequestResult> {
        self.get(&format!("/preapproval/{}", id), &[], true).await
    }

    pub async fn update_preapproval_payment(
        &self,
        id: &str,
        preapproval: &Value,
    ) -> Result<RequestResult> {
        self.put(&format!("/preapproval/{}", id), preapproval, &[])
            .await
    }

    /// Cancel a preapproval; the body is always `{"status": "cancelled"}`
    pub async fn cancel_preapproval_payment(&self, id: &str) -> Result<RequestResult> {
        self.put(
            &format!("/preapproval/{}", id),
            &json!({ "status": "cancelled" }),
            &[],
        )
        .await
    }

    pub async fn create_custom_payment(&self, info: &Value) -> Result<RequestResult> {
        self.dispatch(
            Method::POST,
            "/checkout/custom/create_payment",
            &[],
            Some(info),
            Auth::Bearer,
        )
        .await
    }

    pub async fn create_customer(&self, email: &str) -> Result<RequestResult> {
        self.dispatch(
            Method::POST,
            "/v1/customers",
            &[],
            Some(&json!({ "email": email })),
            Auth::Bearer,
        )
        .await
    }

    pub async fn search_customer(&self, email: &str) -> Result<RequestResult> {
        self.get("/v1/customers/search", &[("email", email)], true)
            .await
    }

    /// Find a customer by email, creating one when the search finds nothing
    ///
    /// Returns the first search match when the search answered 200 with a
    /// positive `paging.total`; otherwise the body of the create call.
    pub async fn get_or_create_customer(&self, payer_email: &str) -> Result<Value> {
        let search = self.search_customer(payer_email).await?;

        if search.status == 200 && search_total(&search.response) > 0 {
            if let Some(customer) = search.response.pointer("/results/0") {
                tracing::debug!("Found existing customer");
                return Ok(customer.clone());
            }
        }

        tracing::info!(search_status = search.status, "Creating customer");
        Ok(self.create_customer(payer_email).await?.response)
    }

    pub async fn create_card_in_customer(
        &self,
        customer_id: &str,
        token: &str,
        payment_method_id: Option<&str>,
        issuer_id: Option<&str>,
    ) -> Result<RequestResult> {
        let request = json!({
            "token": token,
            "issuer_id": issuer_id,
            "payment_method_id": payment_method_id,
        });

        self.dispatch(
            Method::POST,
            &format!("/v1/customers/{}/cards", customer_id),
            &[],
            Some(&request),
            Auth::Bearer,
        )
        .await
    }

    pub async fn get_all_customer_cards(&self, customer_id: &str) -> Result<RequestResult> {
        self.get(&format!("/v1/customers/{}/cards", customer_id), &[], true)
            .await
    }

    pub async fn check_discount_campaigns(
        &self,
        transaction_amount: f64,
        payer_email: &str,
        coupon_code: &str,
    ) -> Result<RequestResult> {
        let amount = transaction_amount.to_string();
        self.get(
            "/discount_campaigns",
            &[
                ("transaction_amount", amount.as_str()),
                ("payer_email", payer_email),
                ("coupon_code", coupon_code),
            ],
            true,
        )
        .await
    }

    pub async fn get_merchant_order(&self, id: &str) -> Result<RequestResult> {
        self.get(&format!("/merchant_orders/{}", id), &[], true).await
    }
}

/// `paging.total` of a search response, 0 when absent
fn search_total(response: &Value) -> i64 {
    response
        .pointer("/paging/total")
        .and_then(Value::as_i64)
        .unwrap_or(0)
}
