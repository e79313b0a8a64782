//! Interactive jar selection for a config without `ledger.jar_id`.

use jarcast_core::ledger::MonobankClient;
use jarcast_sdk::objects::JarItem;
use std::io::{self, BufRead, Write};

/// Fetch the client's jars and ask which one to watch.
///
/// Returns `None` when the user quits or stdin closes.
pub async fn select_jar(client: &MonobankClient) -> anyhow::Result<Option<JarItem>> {
    tracing::info!("No jar configured, fetching jars from Monobank");
    let jars = client.list_jars().await?;
    if jars.is_empty() {
        anyhow::bail!("no jars found on this account; create one in the Monobank app first");
    }

    let choice = tokio::task::spawn_blocking(move || {
        let index = prompt_choice(&jars, io::stdin().lock(), io::stdout().lock())?;
        Ok::<_, io::Error>(index.map(|i| jars[i].clone()))
    })
    .await??;
    Ok(choice)
}

/// List `jars` on `output` and read a 1-based choice from `input`.
///
/// Re-prompts on invalid input; `q` or EOF yields `None`.
fn prompt_choice(
    jars: &[JarItem],
    mut input: impl BufRead,
    mut output: impl Write,
) -> io::Result<Option<usize>> {
    writeln!(output, "\nAvailable jars:\n")?;
    for (i, jar) in jars.iter().enumerate() {
        writeln!(output, "  {}. {}", i + 1, jar.title)?;
        let goal = jar
            .goal
            .map(|goal| format!(" / {}", jarcast_core::utils::amount::format_minor(goal)))
            .unwrap_or_default();
        writeln!(
            output,
            "     Balance: {}{} UAH",
            jarcast_core::utils::amount::format_minor(jar.balance),
            goal
        )?;
        writeln!(output, "     ID: {}", jar.id)?;
        if !jar.description.is_empty() {
            writeln!(output, "     Description: {}", jar.description)?;
        }
        writeln!(output)?;
    }

    let mut line = String::new();
    loop {
        write!(output, "Select jar (1-{}) or 'q' to quit: ", jars.len())?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        match answer.parse::<usize>() {
            Ok(n) if (1..=jars.len()).contains(&n) => return Ok(Some(n - 1)),
            _ => writeln!(output, "Please enter a number between 1 and {}", jars.len())?,
        }
    }
}
