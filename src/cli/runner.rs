//! CLI runner - executes commands

use crate::api::{AsyncDomainToolsConnector, AsyncIpqsConnector};
use crate::broker::{ApiResponse, AsyncBroker, Broker, Call, RequestOptions};
use crate::cli::commands::{Cli, Commands, DomainToolsCommand, OutputFormat};
use crate::config::{BrokerOptions, ResolvedConfig, TransportOptions};
use crate::database::{SqlConnector, SqlEngine, SqlOptions};
use crate::error::{Error, Result};
use crate::types::{Flavor, JsonValue, Method};
use serde_json::json;
use std::time::Duration;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command and print its result
    pub async fn run(&self) -> Result<()> {
        let output = self.execute().await?;
        self.output_message(&output);
        Ok(())
    }

    /// Run the CLI command and return its result as JSON
    pub async fn execute(&self) -> Result<JsonValue> {
        match &self.cli.command {
            Commands::Resolve { base_url } => self.resolve(base_url),
            Commands::Request {
                method,
                url,
                headers,
                query,
                json,
            } => {
                let call = build_call(method, url, headers, query, json.as_deref())?;
                self.request(url, call).await
            }
            Commands::Domaintools {
                api_key,
                base_url,
                command,
            } => {
                self.domaintools(api_key.clone(), base_url.as_deref(), command)
                    .await
            }
            Commands::Ipqs {
                url,
                params,
                api_key,
                base_url,
            } => {
                let params = parse_pairs(params, '=')?;
                let options = self.broker_options(base_url.as_deref().unwrap_or_default())?;
                let connector = AsyncIpqsConnector::new(api_key.clone(), options)?;
                let response = connector.malicious_url(url, &borrowed(&params)).await?;
                Ok(response_to_json(&response))
            }
            Commands::Sql {
                engine,
                connection,
                query,
                params,
                page_size,
                read_only,
            } => {
                let options = SqlOptions::new(engine.parse::<SqlEngine>()?, connection.clone())
                    .read_only(*read_only)
                    .logging(self.cli.verbose);
                let params: Vec<JsonValue> = params.iter().map(|p| parse_sql_param(p)).collect();
                run_sql(options, query.clone(), params, *page_size).await
            }
        }
    }

    /// Broker options from the global flags
    pub fn broker_options(&self, base_url: &str) -> Result<BrokerOptions> {
        let cli = &self.cli;
        let mut builder = BrokerOptions::builder(base_url)
            .logging(cli.verbose)
            .load_env_vars(cli.load_env)
            .trust_env(!cli.no_trust_env)
            .timeout(Duration::from_secs(cli.timeout));

        if let Some(proxy) = &cli.proxy {
            builder = builder.proxy(proxy);
        }
        for (scheme, url) in parse_pairs(&cli.mounts, '=')? {
            builder = builder.mount(scheme, url);
        }
        if let Some(path) = &cli.env_file {
            builder = builder.env_file(path);
        }
        if cli.insecure {
            builder = builder.transport(TransportOptions::new().verify_tls(false));
        }
        if cli.retry {
            builder = builder.enable_backoff();
        }
        Ok(builder.build())
    }

    fn flavor(&self) -> Flavor {
        if self.cli.blocking {
            Flavor::Blocking
        } else {
            Flavor::Async
        }
    }

    fn resolve(&self, base_url: &str) -> Result<JsonValue> {
        let options = self.broker_options(base_url)?;
        let config = ResolvedConfig::resolve(&options, self.flavor())?;
        Ok(config.summary())
    }

    async fn request(&self, url: &str, call: Call) -> Result<JsonValue> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::invalid_parameter(format!(
                "request needs an absolute http(s) URL, got '{url}'"
            )));
        }
        let options = self.broker_options("")?;

        let response = match self.flavor() {
            Flavor::Async => AsyncBroker::new(options)?.send(call).await?,
            // the blocking client owns its own runtime and must not run on ours
            Flavor::Blocking => {
                tokio::task::spawn_blocking(move || -> Result<ApiResponse> {
                    Broker::new(options)?.send(call)
                })
                .await
                .map_err(|e| Error::Other(format!("request worker failed: {e}")))??
            }
        };
        Ok(response_to_json(&response))
    }

    async fn domaintools(
        &self,
        api_key: Option<String>,
        base_url: Option<&str>,
        command: &DomainToolsCommand,
    ) -> Result<JsonValue> {
        let options = self.broker_options(base_url.unwrap_or_default())?;
        let connector = AsyncDomainToolsConnector::new(api_key, options)?;

        let response = match command {
            DomainToolsCommand::Whois { query } => {
                connector.parsed_whois(query, RequestOptions::new()).await?
            }
            DomainToolsCommand::ReverseIp { query } => {
                connector.reverse_ip(query, RequestOptions::new()).await?
            }
            DomainToolsCommand::ReverseNs { query } => {
                connector
                    .reverse_nameserver(query, RequestOptions::new())
                    .await?
            }
            DomainToolsCommand::Iris { params } => {
                let params = parse_pairs(params, '=')?;
                connector.iris_investigate(&borrowed(&params)).await?
            }
        };
        Ok(response_to_json(&response))
    }

    /// Output a message to stdout
    fn output_message(&self, msg: &JsonValue) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

async fn run_sql(
    options: SqlOptions,
    query: String,
    params: Vec<JsonValue>,
    page_size: Option<usize>,
) -> Result<JsonValue> {
    tokio::task::spawn_blocking(move || -> Result<JsonValue> {
        SqlConnector::open(options)?.scope(|connector| -> Result<JsonValue> {
            let rows = match page_size {
                Some(size) => {
                    let mut rows = Vec::new();
                    for page in connector.paginate(&query, size)?.params(params) {
                        rows.extend(page?);
                    }
                    rows
                }
                None => connector.query(&query, &params)?,
            };
            Ok(JsonValue::Array(
                rows.into_iter().map(JsonValue::Object).collect(),
            ))
        })
    })
    .await
    .map_err(|e| Error::Other(format!("sql worker failed: {e}")))?
}

/// Build the call for `apiary request`
pub(crate) fn build_call(
    method: &str,
    url: &str,
    headers: &[String],
    query: &[String],
    json_body: Option<&str>,
) -> Result<Call> {
    let method: Method = method.parse()?;
    let mut options = RequestOptions::new();
    for (name, value) in parse_pairs(headers, ':')? {
        options = options.header(name, value);
    }
    options = options.queries(parse_pairs(query, '=')?);
    if let Some(body) = json_body {
        options = options.json(serde_json::from_str(body)?);
    }
    Ok(Call::new(method, url).with_options(options))
}

/// Split `KEY<sep>VALUE` arguments, trimming whitespace around both halves
pub(crate) fn parse_pairs(args: &[String], separator: char) -> Result<Vec<(String, String)>> {
    args.iter()
        .map(|arg| {
            let (key, value) = arg.split_once(separator).ok_or_else(|| {
                Error::invalid_parameter(format!("expected KEY{separator}VALUE, got '{arg}'"))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::invalid_parameter(format!("empty key in '{arg}'")));
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// JSON literal if it parses, otherwise the raw text
pub(crate) fn parse_sql_param(raw: &str) -> JsonValue {
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

/// Response summary: status, final URL and body (parsed when it is JSON)
pub(crate) fn response_to_json(response: &ApiResponse) -> JsonValue {
    let body = response
        .json::<JsonValue>()
        .unwrap_or_else(|_| JsonValue::String(response.text()));
    json!({
        "status": response.status(),
        "url": crate::redact::scrub_url(response.url().as_str()),
        "body": body,
    })
}

fn borrowed(pairs: &[(String, String)]) -> Vec<(&str, &str)> {
    pairs
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}
