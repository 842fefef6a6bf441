//! AWS Lambda function for charging point proximity search.

use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    chargeclub_lambda_search::run().await
}
