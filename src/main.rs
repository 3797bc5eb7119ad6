//! Console host: reads chat triggers from stdin and prints the replies.

use std::io;
use std::path::Path;
use std::process::ExitCode;

use futures_util::TryStreamExt;
use shell_exec::cli::{self, Args};
use shell_exec::config::Config;
use shell_exec::{logging, PreparedFile, ShellExecHost};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Run 'shell-exec --help' for usage.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(run(args, config));
    // The stdin reader sits on a blocking thread; don't wait for it.
    runtime.shutdown_background();
    code
}

async fn run(args: Args, config: Config) -> ExitCode {
    logging::init(Some(config.log_filter()));

    info!(
        version = env!("CARGO_PKG_VERSION"),
        timeout_secs = config.execution.max_execution_time,
        output_mode = ?config.execution.output_mode,
        base_dir = ?config.file_send.base_directory,
        "shell-exec console ready"
    );

    let host = ShellExecHost::from_config(&config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, exiting");
                break;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "failed to read stdin");
                return ExitCode::FAILURE;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let cancel = async {
            let _ = tokio::signal::ctrl_c().await;
        };
        let Some(reply) = host.handle_message_with_cancel(&line, cancel).await else {
            println!("Unknown trigger. Use: shell <command> | send_file <path>");
            continue;
        };

        println!("{}", reply.text);

        if let Some(file) = reply.attachment {
            if let Err(e) = deliver(file, args.outbox.as_deref()).await {
                warn!(error = %e, "failed to deliver attachment");
                println!("Error while sending file: {}", e);
            }
        }
    }

    ExitCode::SUCCESS
}

/// Stream an attachment into the outbox, or just describe it.
async fn deliver(file: PreparedFile, outbox: Option<&Path>) -> io::Result<()> {
    let Some(dir) = outbox else {
        println!("[attachment] {} ({} bytes)", file.path().display(), file.size());
        return Ok(());
    };

    tokio::fs::create_dir_all(dir).await?;
    let target = dir.join(file.name());
    let mut out = tokio::fs::File::create(&target).await?;

    let stream = file.into_stream();
    tokio::pin!(stream);

    let mut written = 0u64;
    while let Some(chunk) = stream.try_next().await? {
        out.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    out.flush().await?;

    println!("[attachment] saved {} ({} bytes)", target.display(), written);
    Ok(())
}
