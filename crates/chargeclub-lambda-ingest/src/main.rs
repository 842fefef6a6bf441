//! AWS Lambda function for charging point availability ingestion.

use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    chargeclub_lambda_ingest::run().await
}
