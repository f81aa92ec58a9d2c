//! [`JobScheduler`] implementation backed by SQL Server Agent.
//!
//! One session is held for the whole invocation: resolution, baseline,
//! start and every poll tick run on the same connection.

use async_trait::async_trait;
use tiberius::Row;

use jobwatch_core::ports::{JobScheduler, SchedulerError};
use jobwatch_core::types::{ExecutionStatus, HistoryRecord, InstanceId};

use crate::config::ConnectionConfig;
use crate::connection::{self, SqlClient};
use crate::error::classify;
use crate::queries;

pub struct SqlAgentScheduler {
    client: SqlClient,
}

impl SqlAgentScheduler {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, SchedulerError> {
        Ok(Self::from_client(connection::connect(config).await?))
    }

    pub fn from_client(client: SqlClient) -> Self {
        Self { client }
    }

    async fn rows(
        &mut self,
        sql: &str,
        params: &[&dyn tiberius::ToSql],
    ) -> Result<Vec<Row>, SchedulerError> {
        self.client
            .query(sql, params)
            .await
            .map_err(classify)?
            .into_first_result()
            .await
            .map_err(classify)
    }

    async fn first_row(
        &mut self,
        sql: &str,
        params: &[&dyn tiberius::ToSql],
    ) -> Result<Option<Row>, SchedulerError> {
        Ok(self.rows(sql, params).await?.into_iter().next())
    }
}

#[async_trait]
impl JobScheduler for SqlAgentScheduler {
    async fn find_jobs(&mut self, like_pattern: &str) -> Result<Vec<String>, SchedulerError> {
        let rows = self.rows(queries::FIND_JOBS, &[&like_pattern]).await?;
        let mut names = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(name) = row.try_get::<&str, _>(0).map_err(classify)? {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    async fn step_name(
        &mut self,
        job: &str,
        step_id: i32,
    ) -> Result<Option<String>, SchedulerError> {
        let row = self
            .first_row(queries::STEP_NAME_BY_ID, &[&job, &step_id])
            .await?;
        match row {
            Some(row) => Ok(row
                .try_get::<&str, _>(0)
                .map_err(classify)?
                .map(str::to_string)),
            None => Ok(None),
        }
    }

    async fn has_step(&mut self, job: &str, step_name: &str) -> Result<bool, SchedulerError> {
        let row = self.first_row(queries::STEP_EXISTS, &[&job, &step_name]).await?;
        let count = match row {
            Some(row) => row.try_get::<i32, _>("step_count").map_err(classify)?,
            None => None,
        };
        Ok(count.unwrap_or(0) > 0)
    }

    async fn max_history_instance(&mut self, job: &str) -> Result<InstanceId, SchedulerError> {
        let row = self.first_row(queries::MAX_HISTORY_INSTANCE, &[&job]).await?;
        let max_id = match row {
            Some(row) => row.try_get::<i32, _>("max_id").map_err(classify)?,
            None => None,
        };
        Ok(InstanceId::from(max_id.unwrap_or(0)))
    }

    async fn start_job(
        &mut self,
        job: &str,
        step_name: Option<&str>,
    ) -> Result<(), SchedulerError> {
        let result = match step_name {
            Some(step) => {
                self.client
                    .execute(queries::START_JOB_AT_STEP, &[&job, &step])
                    .await
            }
            None => self.client.execute(queries::START_JOB, &[&job]).await,
        };
        result.map_err(classify)?;
        Ok(())
    }

    async fn supports_status_query(&mut self) -> bool {
        let probe = async {
            self.client
                .simple_query(queries::HELP_JOB_PROBE)
                .await?
                .into_results()
                .await
        };
        match probe.await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "sp_help_job not available");
                false
            }
        }
    }

    async fn execution_status(
        &mut self,
        job: &str,
    ) -> Result<Option<ExecutionStatus>, SchedulerError> {
        let Some(row) = self.first_row(queries::HELP_JOB, &[&job]).await? else {
            return Ok(None);
        };
        if !has_column(&row, queries::EXECUTION_STATUS_COLUMN) {
            tracing::debug!(job, "sp_help_job returned no execution status column");
            return Ok(None);
        }
        Ok(row
            .try_get::<i32, _>(queries::EXECUTION_STATUS_COLUMN)
            .map_err(classify)?
            .map(ExecutionStatus))
    }

    async fn latest_history(
        &mut self,
        job: &str,
    ) -> Result<Option<HistoryRecord>, SchedulerError> {
        match self.first_row(queries::LATEST_HISTORY, &[&job]).await? {
            Some(row) => history_record(&row).map(Some).map_err(classify),
            None => Ok(None),
        }
    }
}

fn has_column(row: &Row, name: &str) -> bool {
    row.columns().iter().any(|c| c.name().eq_ignore_ascii_case(name))
}

fn history_record(row: &Row) -> Result<HistoryRecord, tiberius::error::Error> {
    Ok(HistoryRecord {
        instance_id: InstanceId::from(row.try_get::<i32, _>("instance_id")?.unwrap_or(0)),
        run_status: row.try_get::<i32, _>("run_status")?.unwrap_or(-1),
        message: row
            .try_get::<&str, _>("message")?
            .unwrap_or_default()
            .to_string(),
        run_date: row.try_get::<i32, _>("run_date")?,
        run_time: row.try_get::<i32, _>("run_time")?,
        run_duration: row.try_get::<i32, _>("run_duration")?,
    })
}
