// src/common/clock.rs

use chrono::{DateTime, Utc};

/// Fonte de tempo injetável. O cache de cotação e o alocador de números
/// dependem de "agora"; injetar o relógio permite avançar o tempo nos testes
/// em vez de depender do relógio do processo.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Relógio de produção: delega para `Utc::now()`.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Relógio fixo para testes, com avanço manual.
    pub struct FixedClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl FixedClock {
        pub fn at(now: DateTime<Utc>) -> Self {
            Self { now: Mutex::new(now) }
        }

        pub fn advance(&self, duration: chrono::Duration) {
            let mut guard = self.now.lock().unwrap();
            *guard += duration;
        }

        pub fn set(&self, now: DateTime<Utc>) {
            *self.now.lock().unwrap() = now;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }
}
