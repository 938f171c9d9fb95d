//! Statement construction: baseline log access, event-inferred access and validation of
//! declared statements.

use log::debug;
use serde_json::{json, Value};

use crate::config::{EventSource, FunctionConfig, SourceRef};
use crate::error::{RolesPerFunctionError, RolesPerFunctionResult};
use crate::types::{push_unique, Statement};

const LOG_ACTIONS: [&str; 3] = [
    "logs:CreateLogStream",
    "logs:CreateLogGroup",
    "logs:PutLogEvents",
];

const DYNAMODB_STREAM_ACTIONS: [&str; 4] = [
    "dynamodb:GetRecords",
    "dynamodb:GetShardIterator",
    "dynamodb:DescribeStream",
    "dynamodb:ListStreams",
];

const KINESIS_STREAM_ACTIONS: [&str; 4] = [
    "kinesis:GetRecords",
    "kinesis:GetShardIterator",
    "kinesis:DescribeStream",
    "kinesis:ListStreams",
];

const SQS_ACTIONS: [&str; 3] = [
    "sqs:ReceiveMessage",
    "sqs:DeleteMessage",
    "sqs:GetQueueAttributes",
];

const SNS_PUBLISH_ACTIONS: [&str; 1] = ["sns:Publish"];

/// Event source kinds that imply permissions, in the order their statements are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    DynamoDbStream,
    KinesisStream,
    Queue,
}

impl SourceKind {
    const ORDER: [Self; 3] = [Self::DynamoDbStream, Self::KinesisStream, Self::Queue];

    fn actions(self) -> &'static [&'static str] {
        match self {
            Self::DynamoDbStream => &DYNAMODB_STREAM_ACTIONS,
            Self::KinesisStream => &KINESIS_STREAM_ACTIONS,
            Self::Queue => &SQS_ACTIONS,
        }
    }

    fn from_stream_type(stream_type: &str) -> Option<Self> {
        match stream_type {
            "dynamodb" => Some(Self::DynamoDbStream),
            "kinesis" => Some(Self::KinesisStream),
            _ => None,
        }
    }
}

/// Write access to the function's own log group.
pub fn log_statement(log_group_name: &str) -> Statement {
    let arn = format!(
        "arn:${{AWS::Partition}}:logs:${{AWS::Region}}:${{AWS::AccountId}}:log-group:{log_group_name}:*:*"
    );
    Statement::allow(&LOG_ACTIONS, vec![json!({ "Fn::Sub": arn })])
}

/// Publish access to the function's error destination.
pub fn error_destination_statement(destination: &Value) -> Statement {
    Statement::allow_single(&SNS_PUBLISH_ACTIONS, destination.clone())
}

/// Read access to every stream and queue the function is triggered by.
///
/// One statement per source kind, in a fixed kind order, each listing the distinct
/// backing resources in the order they were declared.
pub fn event_source_statements(
    function_id: &str,
    function: &FunctionConfig,
) -> RolesPerFunctionResult<Vec<Statement>> {
    let mut resources: [Vec<Value>; 3] = Default::default();

    for event in function.events() {
        let (kind, source) = match event.source() {
            EventSource::Stream(source) => (stream_kind(function_id, source)?, source),
            EventSource::Queue(source) => (SourceKind::Queue, source),
            EventSource::Other => {
                debug!(
                    "Function '{function_id}': event {:?} implies no permissions",
                    event.other_kinds().collect::<Vec<_>>()
                );
                continue;
            }
        };
        push_unique(&mut resources[kind as usize], source.arn());
    }

    Ok(SourceKind::ORDER
        .iter()
        .zip(resources)
        .filter(|(_, arns)| !arns.is_empty())
        .map(|(kind, arns)| Statement::allow(kind.actions(), arns))
        .collect())
}

/// Stream type from the explicit `type` field, else the service component of the ARN
fn stream_kind(function_id: &str, source: &SourceRef) -> RolesPerFunctionResult<SourceKind> {
    let stream_type = match source.declared_type() {
        Some(declared) => declared.to_string(),
        None => match source.arn() {
            Value::String(arn) => arn.split(':').nth(2).unwrap_or_default().to_string(),
            other => other.to_string(),
        },
    };
    SourceKind::from_stream_type(&stream_type)
        .ok_or_else(|| RolesPerFunctionError::unsupported_stream_type(function_id, stream_type))
}

/// Check every declared statement has `Effect`, `Action`/`NotAction` and
/// `Resource`/`NotResource`, reporting all offending statements at once.
pub fn validate_statements(statements: &[Statement]) -> RolesPerFunctionResult<()> {
    let violations: Vec<String> = statements
        .iter()
        .enumerate()
        .filter_map(|(index, statement)| {
            let missing = statement.missing_fields();
            (!missing.is_empty()).then(|| {
                format!(
                    "statement {index} is missing the following properties: {}",
                    missing.join(", ")
                )
            })
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(RolesPerFunctionError::MalformedStatements(violations.join("; ")))
    }
}
