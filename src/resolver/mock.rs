use super::{DnsResolver, Record, RecordType, ZoneRecord};
use crate::error::DnsError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Resolver with canned answers, for tests.
///
/// Unknown names fail with `NameError`. A name that has records of some
/// other type fails with `NoAnswer`. Entries named `*.<suffix>` answer for
/// any name below the suffix that has no exact entry, like a wildcard
/// record in a real zone.
///
/// # Example
///
/// ```
/// use dnsposture::resolver::{DnsResolver, MockResolver, Record, RecordType};
///
/// let mock = MockResolver::new()
///     .with_records("example.test", vec![Record::Txt(b"v=spf1 -all".to_vec())]);
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let records = rt.block_on(mock.resolve("example.test", RecordType::Txt)).unwrap();
/// assert_eq!(records.len(), 1);
/// ```
#[derive(Default)]
pub struct MockResolver {
    answers: HashMap<(String, RecordType), Result<Vec<Record>, DnsError>>,
    zone: Option<Result<Vec<ZoneRecord>, DnsError>>,
    queries: Mutex<Vec<(String, RecordType)>>,
    transfers: Mutex<usize>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds answer records for `name`, grouped by their record type.
    pub fn with_records(mut self, name: &str, records: Vec<Record>) -> Self {
        for record in records {
            let entry = self
                .answers
                .entry((name.to_lowercase(), record.record_type()))
                .or_insert_with(|| Ok(Vec::new()));
            if let Ok(existing) = entry {
                existing.push(record);
            }
        }
        self
    }

    /// Makes a query for `name` and `record_type` fail with `error`.
    pub fn with_error(mut self, name: &str, record_type: RecordType, error: DnsError) -> Self {
        self.answers.insert((name.to_lowercase(), record_type), Err(error));
        self
    }

    /// Allows zone transfers, answering with `records`.
    pub fn with_zone(mut self, records: Vec<ZoneRecord>) -> Self {
        self.zone = Some(Ok(records));
        self
    }

    /// Makes zone transfers fail with `error`. Without any zone configured
    /// transfers are refused.
    pub fn with_zone_error(mut self, error: DnsError) -> Self {
        self.zone = Some(Err(error));
        self
    }

    /// Every `resolve` call so far, in order.
    pub fn queries(&self) -> Vec<(String, RecordType)> {
        self.queries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of `transfer_zone` calls so far.
    pub fn transfer_attempts(&self) -> usize {
        *self.transfers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn has_name(&self, name: &str) -> bool {
        self.answers.keys().any(|(n, _)| n == name)
    }

    fn wildcard_for(&self, name: &str) -> Option<String> {
        let mut labels = name.splitn(2, '.');
        labels.next()?;
        let mut parent = labels.next()?;
        loop {
            let candidate = format!("*.{}", parent);
            if self.has_name(&candidate) {
                return Some(candidate);
            }
            parent = parent.split_once('.')?.1;
        }
    }
}

#[async_trait]
impl DnsResolver for MockResolver {
    async fn resolve(&self, name: &str, record_type: RecordType) -> Result<Vec<Record>, DnsError> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_string(), record_type));

        let key = name.trim_end_matches('.').to_lowercase();
        let owner = if self.has_name(&key) {
            key
        } else if let Some(wildcard) = self.wildcard_for(&key) {
            wildcard
        } else {
            return Err(DnsError::NameError {
                name: name.to_string(),
            });
        };

        match self.answers.get(&(owner, record_type)) {
            Some(Ok(records)) if !records.is_empty() => Ok(records.clone()),
            Some(Err(e)) => Err(e.clone()),
            _ => Err(DnsError::NoAnswer {
                name: name.to_string(),
            }),
        }
    }

    async fn transfer_zone(&self, _domain: &str, _timeout: Duration) -> Result<Vec<ZoneRecord>, DnsError> {
        *self.transfers.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        self.zone.clone().unwrap_or(Err(DnsError::Refused))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_unknown_name_is_name_error() {
        let mock = MockResolver::new();
        let err = mock.resolve("nothing.test", RecordType::A).await.unwrap_err();
        assert_eq!(err, DnsError::NameError { name: "nothing.test".to_string() });
    }

    #[tokio::test]
    async fn test_other_type_is_no_answer() {
        let mock = MockResolver::new().with_records("example.test", vec![Record::A(Ipv4Addr::LOCALHOST)]);
        let err = mock.resolve("example.test", RecordType::Mx).await.unwrap_err();
        assert!(matches!(err, DnsError::NoAnswer { .. }));
    }

    #[tokio::test]
    async fn test_wildcard_answers_below_suffix() {
        let mock = MockResolver::new().with_records("*.example.test", vec![Record::A(Ipv4Addr::new(192, 0, 2, 7))]);

        let records = mock.resolve("482913.test.example.test", RecordType::A).await.unwrap();
        assert_eq!(records, vec![Record::A(Ipv4Addr::new(192, 0, 2, 7))]);
        assert!(mock.resolve("example.test", RecordType::A).await.is_err());
    }

    #[tokio::test]
    async fn test_records_queries() {
        let mock = MockResolver::new();
        let _ = mock.resolve("a.test", RecordType::Ns).await;
        let _ = mock.resolve("b.test", RecordType::Txt).await;
        assert_eq!(
            mock.queries(),
            vec![("a.test".to_string(), RecordType::Ns), ("b.test".to_string(), RecordType::Txt)]
        );
    }

    #[tokio::test]
    async fn test_zone_transfer_refused_by_default() {
        let mock = MockResolver::new();
        let result = mock.transfer_zone("example.test", Duration::from_secs(5)).await;
        assert_eq!(result, Err(DnsError::Refused));
        assert_eq!(mock.transfer_attempts(), 1);
    }

    #[test]
    fn test_query_log_survives_poisoned_lock() {
        let mock = MockResolver::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = mock.queries.lock().unwrap();
            panic!("poison");
        }));
        assert!(mock.queries.is_poisoned());

        tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(async {
                let _ = mock.resolve("a.test", RecordType::A).await;
                let _ = mock.transfer_zone("a.test", Duration::from_secs(1)).await;
            });
        assert_eq!(mock.queries(), vec![("a.test".to_string(), RecordType::A)]);
        assert_eq!(mock.transfer_attempts(), 1);
    }
}
