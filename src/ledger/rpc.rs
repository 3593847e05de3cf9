//! HTTP ledger client.
//!
//! Talks to a lockbox indexer endpoint over JSON. Event subscriptions are
//! realized as cursor-based polling tasks; the remote side only guarantees
//! at-least-once visibility, which the mirror's idempotent refresh absorbs.

use std::time::Duration;

use serde_json::{json, Value};

use crate::error::LedgerError;

use super::{
    ConfirmationStatus, EventCallback, EventClass, Ledger, Subscription, SubmissionHandle, TxKind,
};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct RpcLedger {
    client: reqwest::Client,
    base_url: String,
    contract_address: String,
    poll_interval: Duration,
}

impl RpcLedger {
    pub fn new(base_url: impl Into<String>, contract_address: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            contract_address: contract_address.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn contract_url(&self, path: &str) -> String {
        format!(
            "{}/contract/{}/{}",
            self.base_url, self.contract_address, path
        )
    }

    async fn get_json(&self, url: &str) -> Result<Value, LedgerError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LedgerError::Rpc(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))
    }

    fn event_query(class: EventClass) -> &'static str {
        match class {
            EventClass::DepositObserved => "deposit",
            EventClass::WithdrawalObserved => "withdrawal",
        }
    }
}

#[async_trait::async_trait]
impl Ledger for RpcLedger {
    async fn read_balance(&self) -> Result<u128, LedgerError> {
        let body = self.get_json(&self.contract_url("balance")).await?;
        // Balances are wei-denominated and may exceed u64, so the endpoint
        // serializes them as decimal strings.
        match &body["balance"] {
            Value::String(raw) => raw
                .parse()
                .map_err(|_| LedgerError::Rpc(format!("bad balance: {}", raw))),
            Value::Number(n) => n
                .as_u64()
                .map(u128::from)
                .ok_or_else(|| LedgerError::Rpc(format!("bad balance: {}", n))),
            other => Err(LedgerError::Rpc(format!("bad balance: {}", other))),
        }
    }

    async fn read_unlock_time(&self) -> Result<u64, LedgerError> {
        let body = self.get_json(&self.contract_url("unlock-time")).await?;
        body["unlockTime"]
            .as_u64()
            .ok_or_else(|| LedgerError::Rpc(format!("bad unlock time: {}", body)))
    }

    async fn read_owner(&self) -> Result<Option<String>, LedgerError> {
        let body = self.get_json(&self.contract_url("owner")).await?;
        Ok(body["owner"].as_str().map(str::to_string))
    }

    async fn submit_transaction(
        &self,
        kind: TxKind,
        value: Option<u128>,
    ) -> Result<SubmissionHandle, LedgerError> {
        let payload = json!({
            "kind": kind.to_string(),
            "value": value.map(|v| v.to_string()),
        });

        let response = self
            .client
            .post(self.contract_url("transactions"))
            .json(&payload)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        if response.status().as_u16() == 403 {
            let reason = response.text().await.unwrap_or_default();
            return Err(LedgerError::Rejected(reason));
        }
        if !response.status().is_success() {
            return Err(LedgerError::Rpc(format!(
                "submission returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;
        let hash = body["hash"]
            .as_str()
            .ok_or_else(|| LedgerError::Rpc(format!("submission response missing hash: {}", body)))?;

        log::info!("Submitted {} transaction: {}", kind, hash);
        Ok(SubmissionHandle::new(hash))
    }

    async fn await_confirmation(
        &self,
        handle: &SubmissionHandle,
    ) -> Result<ConfirmationStatus, LedgerError> {
        let url = format!("{}/transactions/{}", self.base_url, handle);
        loop {
            let body = self.get_json(&url).await?;
            match body["status"].as_str() {
                Some("confirmed") => return Ok(ConfirmationStatus::Confirmed),
                Some("failed") | Some("reverted") => return Ok(ConfirmationStatus::Failed),
                // Still pending; the endpoint makes no promise about when
                // (or whether) this settles.
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }

    fn subscribe(&self, class: EventClass, on_event: EventCallback) -> Subscription {
        let client = self.client.clone();
        let poll_interval = self.poll_interval;
        let url = self.contract_url(&format!("events?class={}", Self::event_query(class)));

        let task = tokio::spawn(async move {
            let mut cursor: Option<u64> = None;
            let mut interval = tokio::time::interval(poll_interval);
            loop {
                interval.tick().await;

                let body: Value = match client.get(&url).send().await {
                    Ok(response) if response.status().is_success() => {
                        match response.json().await {
                            Ok(body) => body,
                            Err(e) => {
                                log::debug!("Event poll decode failed: {}", e);
                                continue;
                            }
                        }
                    }
                    Ok(response) => {
                        log::debug!("Event poll returned {}", response.status());
                        continue;
                    }
                    Err(e) => {
                        log::debug!("Event poll failed: {}", e);
                        continue;
                    }
                };

                let latest = body["cursor"].as_u64();
                // First poll only establishes the cursor; deliveries start
                // with the next advance.
                if let (Some(prev), Some(latest)) = (cursor, latest) {
                    if latest > prev {
                        on_event();
                    }
                }
                if latest.is_some() {
                    cursor = latest;
                }
            }
        });

        Subscription::new(move || task.abort())
    }
}
