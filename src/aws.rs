//! AWS SDK implementation of the [`FunctionApi`] seam.
//!
//! The pipeline runs on a blocking thread, so each call bridges into the
//! async SDK through a stored runtime handle. Lookup 404s are the only
//! errors classified specially; everything else is carried as an opaque
//! transport/permission message.

use aws_config::SdkConfig;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::operation::get_alias::GetAliasError;
use aws_sdk_lambda::operation::get_function::GetFunctionError;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::VpcConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use tokio::runtime::Handle;

use crate::api::{AliasSpec, ApiError, CodeSource, FunctionApi, FunctionConfig};
use crate::options::ConfigDelta;

pub struct AwsFunctionApi {
    handle: Handle,
    lambda: aws_sdk_lambda::Client,
    s3: aws_sdk_s3::Client,
}

impl AwsFunctionApi {
    pub fn new(config: &SdkConfig, handle: Handle) -> Self {
        AwsFunctionApi {
            handle,
            lambda: aws_sdk_lambda::Client::new(config),
            s3: aws_sdk_s3::Client::new(config),
        }
    }

    async fn upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        bytes: &[u8],
        part_size: usize,
    ) -> Result<Vec<CompletedPart>, ApiError> {
        let mut parts = Vec::new();
        for (index, chunk) in bytes.chunks(part_size.max(1)).enumerate() {
            let part_number = index as i32 + 1;
            let uploaded = self
                .s3
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(chunk.to_vec()))
                .send()
                .await
                .map_err(|error| ApiError::Api(transport_message(&error)))?;
            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .set_e_tag(uploaded.e_tag().map(str::to_string))
                    .build(),
            );
        }
        Ok(parts)
    }
}

impl FunctionApi for AwsFunctionApi {
    fn get_function_config(&self, target: &str) -> Result<FunctionConfig, ApiError> {
        self.handle.block_on(async {
            let output = self
                .lambda
                .get_function()
                .function_name(target)
                .send()
                .await
                .map_err(|error| {
                    if error
                        .as_service_error()
                        .is_some_and(GetFunctionError::is_resource_not_found_exception)
                    {
                        ApiError::NotFound
                    } else {
                        ApiError::Api(transport_message(&error))
                    }
                })?;

            let configuration = output.configuration();
            Ok(FunctionConfig {
                function_arn: configuration
                    .and_then(|config| config.function_arn().map(str::to_string)),
                handler: configuration.and_then(|config| config.handler().map(str::to_string)),
            })
        })
    }

    fn update_function_code(&self, target: &str, source: CodeSource) -> Result<(), ApiError> {
        self.handle.block_on(async {
            let request = self.lambda.update_function_code().function_name(target);
            let request = match source {
                CodeSource::Inline(bytes) => request.zip_file(Blob::new(bytes)),
                CodeSource::Stored { bucket, key } => request.s3_bucket(bucket).s3_key(key),
            };
            request
                .send()
                .await
                .map(|_| ())
                .map_err(|error| ApiError::Api(transport_message(&error)))
        })
    }

    fn update_function_configuration(
        &self,
        target: &str,
        delta: &ConfigDelta,
    ) -> Result<(), ApiError> {
        let vpc_config = delta.vpc.as_ref().map(|vpc| {
            VpcConfig::builder()
                .set_subnet_ids(Some(vpc.subnet_ids.clone()))
                .set_security_group_ids(Some(vpc.security_group_ids.clone()))
                .build()
        });

        self.handle.block_on(async {
            self.lambda
                .update_function_configuration()
                .function_name(target)
                .set_timeout(delta.timeout)
                .set_memory_size(delta.memory)
                .set_handler(delta.handler.clone())
                .set_vpc_config(vpc_config)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| ApiError::Api(transport_message(&error)))
        })
    }

    fn publish_version(&self, target: &str, description: &str) -> Result<String, ApiError> {
        self.handle.block_on(async {
            let output = self
                .lambda
                .publish_version()
                .function_name(target)
                .description(description)
                .send()
                .await
                .map_err(|error| ApiError::Api(transport_message(&error)))?;
            output
                .version()
                .map(str::to_string)
                .ok_or_else(|| ApiError::Api("publish did not return a version".to_string()))
        })
    }

    fn get_alias(&self, target: &str, name: &str) -> Result<AliasSpec, ApiError> {
        self.handle.block_on(async {
            let output = self
                .lambda
                .get_alias()
                .function_name(target)
                .name(name)
                .send()
                .await
                .map_err(|error| {
                    if error
                        .as_service_error()
                        .is_some_and(GetAliasError::is_resource_not_found_exception)
                    {
                        ApiError::NotFound
                    } else {
                        ApiError::Api(transport_message(&error))
                    }
                })?;

            Ok(AliasSpec {
                name: output.name().unwrap_or(name).to_string(),
                version: output.function_version().unwrap_or_default().to_string(),
                description: output.description().unwrap_or_default().to_string(),
            })
        })
    }

    fn create_alias(&self, target: &str, alias: &AliasSpec) -> Result<(), ApiError> {
        self.handle.block_on(async {
            self.lambda
                .create_alias()
                .function_name(target)
                .name(&alias.name)
                .function_version(&alias.version)
                .description(&alias.description)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| ApiError::Api(transport_message(&error)))
        })
    }

    fn update_alias(&self, target: &str, alias: &AliasSpec) -> Result<(), ApiError> {
        self.handle.block_on(async {
            self.lambda
                .update_alias()
                .function_name(target)
                .name(&alias.name)
                .function_version(&alias.version)
                .description(&alias.description)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| ApiError::Api(transport_message(&error)))
        })
    }

    fn staged_upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        part_size: usize,
    ) -> Result<(), ApiError> {
        self.handle.block_on(async {
            let created = self
                .s3
                .create_multipart_upload()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|error| ApiError::Api(transport_message(&error)))?;
            let upload_id = created
                .upload_id()
                .ok_or_else(|| {
                    ApiError::Api("multipart upload did not return an upload id".to_string())
                })?
                .to_string();

            let completed = match self
                .upload_parts(bucket, key, &upload_id, bytes, part_size)
                .await
            {
                Ok(parts) => parts,
                Err(error) => {
                    // A failed upload must not linger as a dangling partial
                    // object; the abort itself is best-effort.
                    let _ = self
                        .s3
                        .abort_multipart_upload()
                        .bucket(bucket)
                        .key(key)
                        .upload_id(&upload_id)
                        .send()
                        .await;
                    return Err(error);
                }
            };

            self.s3
                .complete_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(&upload_id)
                .multipart_upload(
                    CompletedMultipartUpload::builder()
                        .set_parts(Some(completed))
                        .build(),
                )
                .send()
                .await
                .map(|_| ())
                .map_err(|error| ApiError::Api(transport_message(&error)))
        })
    }
}

fn transport_message<E: std::error::Error>(error: &E) -> String {
    DisplayErrorContext(error).to_string()
}
