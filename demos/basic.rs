use apicheck_http::{ClientOptions, LogicalRequest, RequestExecutor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = std::env::var("APICHECK_BASE_URL")?;
    let token = std::env::var("APICHECK_TOKEN")?;

    let executor = RequestExecutor::new(
        ClientOptions {
            max_retries: 3,
            ..ClientOptions::default()
        }
        .with_additional_header("X-Client", "apicheck-demo"),
    )?;

    let mut request = LogicalRequest::get("/me");
    request.set_accept("application/json");
    request.set_authorization(format!("Bearer {token}"));

    println!("{}", request.full_http_text());

    let response = executor.execute(&request, &base_url).await?;
    println!("retries: {}", response.retry_count());
    println!("{}", response.full_text());

    Ok(())
}
