// SPDX-License-Identifier: MIT

//! Subcommand definitions and their dispatch. One `run_*` function per leaf
//! command, kept flat rather than split per-entity (`client_queries*.rs` in
//! the teacher) since this surface is a fraction of its size.

use crate::client::OrcClient;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, format_time_ago, handle_list, OutputFormat};
use clap::{Parser, Subcommand};
use orc_core::dto::{CreateJobRequest, CreateWorkflowRequest};
use orc_core::{JobId, RetryPolicyKind, WorkerId, WorkflowId};

#[derive(Debug, Parser)]
#[command(name = "orc", about = "Submit and inspect jobs on an orcd control plane")]
pub struct Cli {
    /// Path to orcd's IPC socket. Defaults to ORC_SOCKET_PATH, or
    /// $ORC_STATE_DIR/orcd.sock.
    #[arg(long, global = true)]
    pub socket: Option<std::path::PathBuf>,

    /// Output format.
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit, inspect, or cancel jobs.
    #[command(subcommand)]
    Job(JobCommand),
    /// Create workflows and inspect their aggregate status.
    #[command(subcommand)]
    Workflow(WorkflowCommand),
    /// Inspect registered workers.
    #[command(subcommand)]
    Worker(WorkerCommand),
    /// Inspect or manage the ready queue and dead-letter queue.
    #[command(subcommand)]
    Queue(QueueCommand),
}

#[derive(Debug, Subcommand)]
pub enum JobCommand {
    /// Submit a new job.
    Submit {
        /// Job type name, looked up against a worker's handler registry.
        #[arg(long = "type")]
        job_type: String,
        /// JSON payload handed to the handler verbatim.
        #[arg(long, default_value = "null")]
        payload: String,
        /// Idempotency key; resubmitting the same key returns the original job.
        #[arg(long)]
        idempotency_key: String,
        #[arg(long, default_value_t = 5)]
        priority: u8,
        #[arg(long, default_value_t = 3)]
        max_attempts: u32,
        #[arg(long, default_value_t = 3600)]
        timeout_secs: u64,
        /// One of fixed, exponential, jitter.
        #[arg(long, default_value = "exponential")]
        retry_policy: String,
        #[arg(long)]
        base_delay_secs: Option<u64>,
        #[arg(long)]
        scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
        #[arg(long)]
        workflow_id: Option<WorkflowId>,
    },
    /// Fetch a job by id.
    Get { id: JobId },
    /// Cancel a job that has not yet reached a terminal status.
    Cancel { id: JobId },
}

#[derive(Debug, Subcommand)]
pub enum WorkflowCommand {
    /// Create a new workflow.
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "null")]
        config: String,
    },
    /// Attach a job to a workflow.
    Attach {
        #[arg(long)]
        workflow_id: WorkflowId,
        #[arg(long)]
        job_id: JobId,
    },
    /// Show a workflow's aggregate status and job counts.
    Status { id: WorkflowId },
}

#[derive(Debug, Subcommand)]
pub enum WorkerCommand {
    /// List active workers.
    List,
    /// Forcibly deregister a worker (e.g. one that will never come back).
    Deregister { id: WorkerId },
}

#[derive(Debug, Subcommand)]
pub enum QueueCommand {
    /// Show ready-queue and dead-letter-queue depth.
    Stats,
    /// Drain every ready entry without running it.
    Purge,
    /// List jobs parked in the dead-letter queue.
    Dlq,
}

fn parse_retry_policy(s: &str) -> Result<RetryPolicyKind, ExitError> {
    match s {
        "fixed" => Ok(RetryPolicyKind::Fixed),
        "exponential" => Ok(RetryPolicyKind::Exponential),
        "jitter" => Ok(RetryPolicyKind::Jitter),
        other => Err(ExitError::new(4, format!("invalid --retry-policy '{other}': expected fixed, exponential, or jitter"))),
    }
}

fn parse_json(s: &str) -> Result<serde_json::Value, ExitError> {
    serde_json::from_str(s).map_err(|e| ExitError::new(4, format!("invalid JSON: {e}")))
}

pub async fn run(client: &OrcClient, format: OutputFormat, command: Command) -> Result<(), ExitError> {
    match command {
        Command::Job(cmd) => run_job(client, format, cmd).await,
        Command::Workflow(cmd) => run_workflow(client, format, cmd).await,
        Command::Worker(cmd) => run_worker(client, format, cmd).await,
        Command::Queue(cmd) => run_queue(client, format, cmd).await,
    }
}

async fn run_job(client: &OrcClient, format: OutputFormat, cmd: JobCommand) -> Result<(), ExitError> {
    match cmd {
        JobCommand::Submit {
            job_type,
            payload,
            idempotency_key,
            priority,
            max_attempts,
            timeout_secs,
            retry_policy,
            base_delay_secs,
            scheduled_at,
            workflow_id,
        } => {
            let req = CreateJobRequest {
                job_type,
                payload: parse_json(&payload)?,
                idempotency_key,
                priority,
                max_attempts,
                timeout_secs,
                retry_policy: parse_retry_policy(&retry_policy)?,
                base_delay_secs,
                scheduled_at,
                workflow_id,
            };
            let job = client.create_job(req).await?;
            format_or_json(format, &job, || println!("created job {} ({})", job.id, job.status))?;
        }
        JobCommand::Get { id } => {
            let job = client.get_job(id).await?;
            format_or_json(format, &job, || print_job(&job))?;
        }
        JobCommand::Cancel { id } => {
            let job = client.cancel_job(id).await?;
            format_or_json(format, &job, || println!("canceled job {}", job.id))?;
        }
    }
    Ok(())
}

fn print_job(job: &orc_core::Job) {
    println!("id:            {}", job.id);
    println!("type:          {}", job.job_type);
    println!("status:        {}", job.status);
    println!("attempt:       {}/{}", job.attempt, job.max_attempts);
    println!("priority:      {}", job.priority);
    println!("created:       {} ago", format_time_ago(job.created_at));
    if let Some(worker_id) = job.worker_id {
        println!("worker:        {worker_id}");
    }
    if let Some(reason) = &job.error_message {
        println!("error:         {reason}");
    }
    if let Some(result) = &job.result {
        println!("result:        {result}");
    }
}

async fn run_workflow(client: &OrcClient, format: OutputFormat, cmd: WorkflowCommand) -> Result<(), ExitError> {
    match cmd {
        WorkflowCommand::Create { name, description, config } => {
            let req = CreateWorkflowRequest { name, description, config: parse_json(&config)? };
            let workflow = client.create_workflow(req).await?;
            format_or_json(format, &workflow, || println!("created workflow {} ({})", workflow.id, workflow.name))?;
        }
        WorkflowCommand::Attach { workflow_id, job_id } => {
            client.attach_job_to_workflow(workflow_id, job_id).await?;
            if format == OutputFormat::Text {
                println!("attached job {job_id} to workflow {workflow_id}");
            }
        }
        WorkflowCommand::Status { id } => {
            let status = client.get_workflow_status(id).await?;
            format_or_json(format, &status, || {
                println!("status: {}", status.status);
                println!(
                    "jobs:   {} pending, {} running, {} success, {} failed, {} canceled",
                    status.counts.pending, status.counts.running, status.counts.success, status.counts.failed, status.counts.canceled
                );
            })?;
        }
    }
    Ok(())
}

async fn run_worker(client: &OrcClient, format: OutputFormat, cmd: WorkerCommand) -> Result<(), ExitError> {
    match cmd {
        WorkerCommand::List => {
            let workers = client.list_active_workers().await?;
            handle_list(format, &workers, "no active workers", |workers| {
                for w in workers {
                    println!(
                        "{}  {}  {}  heartbeat {} ago  {}/{} slots",
                        w.id, w.hostname, w.status, format_time_ago(w.last_heartbeat), w.max_concurrent_jobs, w.max_concurrent_jobs
                    );
                }
            })?;
        }
        WorkerCommand::Deregister { id } => {
            client.deregister_worker(id).await?;
            if format == OutputFormat::Text {
                println!("deregistered worker {id}");
            }
        }
    }
    Ok(())
}

async fn run_queue(client: &OrcClient, format: OutputFormat, cmd: QueueCommand) -> Result<(), ExitError> {
    match cmd {
        QueueCommand::Stats => {
            let stats = client.get_queue_stats().await?;
            format_or_json(format, &stats, || {
                println!("ready: {}", stats.ready_len);
                println!("dlq:   {}", stats.dlq_len);
            })?;
        }
        QueueCommand::Purge => {
            client.purge_queue().await?;
            if format == OutputFormat::Text {
                println!("queue purged");
            }
        }
        QueueCommand::Dlq => {
            let jobs = client.list_dead_letter_jobs().await?;
            handle_list(format, &jobs, "dead-letter queue is empty", |jobs| {
                for job in jobs {
                    println!("{}  {}  attempt {}/{}  {}", job.id, job.job_type, job.attempt, job.max_attempts, job.error_message.as_deref().unwrap_or("-"));
                }
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
