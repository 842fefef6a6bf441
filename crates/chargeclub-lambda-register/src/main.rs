//! AWS Lambda function for charging point registration.

use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    chargeclub_lambda_register::run().await
}
