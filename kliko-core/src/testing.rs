//! Test doubles for the upstream boundary and the clock.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::model::{OperatorId, OperatorMeta};
use crate::ports::{Clock, FetchError, UpstreamPort};

/// Clock that only moves when told to.
pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: Mutex::new(
                Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
                    .single()
                    .expect("valid fixed instant"),
            ),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// Upstream serving a fixed body and counting requests.
pub(crate) struct StubUpstream {
    meta: OperatorMeta,
    body: Vec<u8>,
    calls: AtomicUsize,
}

impl StubUpstream {
    pub(crate) fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            meta: OperatorMeta {
                id: OperatorId("stub".to_owned()),
                name: "Stub".to_owned(),
                url: "http://upstream.invalid/".to_owned(),
            },
            body: body.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamPort for StubUpstream {
    fn operator(&self) -> &OperatorMeta {
        &self.meta
    }

    async fn fetch_document(&self) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

/// Page with the given script text embedded the way the operator does it.
pub(crate) fn page_with_script(script: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><title>Containers</title></head>\n<body>\n\
         <div id=\"map\"></div>\n<script type=\"text/javascript\">\n{script}\n</script>\n</body></html>"
    )
}
