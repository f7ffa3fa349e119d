use claw_keepalive::domain::model::RunSummary;

#[tokio::main]
async fn main() {
    report(claw_keepalive::run().await);
}

/// Outcomes go to notifications and logs; the exit status stays 0
fn report(result: anyhow::Result<RunSummary>) {
    match result {
        Ok(summary) => {
            tracing::info!(
                "Done: {} succeeded, {} skipped, {} failed",
                summary.success,
                summary.skipped,
                summary.failed
            );
        }
        Err(e) => {
            // Logging may not be up yet when configuration is rejected
            tracing::error!("Keep-alive run aborted: {:#}", e);
            eprintln!("Error: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_error_is_reported_not_fatal() {
        report(Err(anyhow::anyhow!("target.base_url is empty")));
        report(Ok(RunSummary::default()));
    }
}
