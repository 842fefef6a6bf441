//! AWS Lambda function for charging point slot booking.

use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    chargeclub_lambda_book::run().await
}
