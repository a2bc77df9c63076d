// src/services/sequence_service.rs
//
// Alocação dos números de documento: OPDEXPORT + AAAAMMDD + contador de
// três dígitos. O contador é diário e global (não por empresa); dois
// chamadores concorrentes nunca recebem o mesmo número porque o incremento
// acontece de forma atômica no store.

use std::sync::Arc;

use crate::{
    common::{clock::Clock, error::AppError},
    db::store::SequenceStore,
};

pub const DOCUMENT_PREFIX: &str = "OPDEXPORT";

#[derive(Clone)]
pub struct SequenceAllocator {
    store: Arc<dyn SequenceStore>,
    clock: Arc<dyn Clock>,
}

impl SequenceAllocator {
    pub fn new(store: Arc<dyn SequenceStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Próximo número do dia corrente.
    pub async fn next_number(&self) -> Result<String, AppError> {
        // A data é capturada uma única vez, aqui no início: uma virada de
        // meia-noite no meio da alocação não muda o dia usado no número.
        let today = self.clock.now().date_naive();
        let seq = self.store.next_daily_sequence(today).await?;

        Ok(format!("{}{}{:03}", DOCUMENT_PREFIX, today.format("%Y%m%d"), seq))
    }
}

/// Valida o formato OPDEXPORT + 8 dígitos de data + 3 dígitos de contador.
pub fn is_valid_document_number(number: &str) -> bool {
    number
        .strip_prefix(DOCUMENT_PREFIX)
        .is_some_and(|rest| rest.len() == 11 && rest.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::clock::test_support::FixedClock;
    use crate::db::memory::InMemorySequenceRepository;
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashSet;

    fn clock_at(rfc3339: &str) -> Arc<FixedClock> {
        Arc::new(FixedClock::at(
            DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc),
        ))
    }

    #[tokio::test]
    async fn numbers_are_zero_padded_and_sequential() {
        let clock = clock_at("2025-09-17T10:00:00Z");
        let allocator =
            SequenceAllocator::new(Arc::new(InMemorySequenceRepository::new()), clock);

        assert_eq!(allocator.next_number().await.unwrap(), "OPDEXPORT20250917001");
        assert_eq!(allocator.next_number().await.unwrap(), "OPDEXPORT20250917002");
        assert_eq!(allocator.next_number().await.unwrap(), "OPDEXPORT20250917003");
    }

    #[tokio::test]
    async fn counter_resets_on_day_rollover() {
        let clock = clock_at("2025-09-17T23:59:59Z");
        let allocator = SequenceAllocator::new(
            Arc::new(InMemorySequenceRepository::new()),
            clock.clone(),
        );

        assert_eq!(allocator.next_number().await.unwrap(), "OPDEXPORT20250917001");

        clock.advance(Duration::seconds(2));
        assert_eq!(allocator.next_number().await.unwrap(), "OPDEXPORT20250918001");
    }

    #[tokio::test]
    async fn concurrent_allocations_never_collide() {
        let clock = clock_at("2025-09-17T10:00:00Z");
        let allocator = Arc::new(SequenceAllocator::new(
            Arc::new(InMemorySequenceRepository::new()),
            clock,
        ));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let allocator = allocator.clone();
            handles.push(tokio::spawn(async move {
                allocator.next_number().await.unwrap()
            }));
        }

        let mut numbers = HashSet::new();
        for handle in handles {
            let number = handle.await.unwrap();
            assert!(is_valid_document_number(&number), "formato ruim: {}", number);
            assert!(number.starts_with("OPDEXPORT20250917"));
            assert!(numbers.insert(number), "número duplicado");
        }
        assert_eq!(numbers.len(), 50);
    }

    #[test]
    fn document_number_format_validation() {
        assert!(is_valid_document_number("OPDEXPORT20250917001"));
        assert!(!is_valid_document_number("OPDEXPORT2025091700"));
        assert!(!is_valid_document_number("OPDEXPORT202509170012"));
        assert!(!is_valid_document_number("OPDEXPORT20250917ABC"));
        assert!(!is_valid_document_number("EXPORT20250917001"));
    }
}
