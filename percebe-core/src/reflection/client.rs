//! # Reflection Client
//!
//! A schema-discovery client for the gRPC Server Reflection Protocol.
//!
//! A session is one bidirectional stream driven by a counting state machine:
//! `AwaitingServiceList` after the initial `list_services` request, then
//! `AwaitingDescriptors` while file-descriptor responses are outstanding.
//! Every request written to the stream bumps the in-flight count, every
//! response decrements it, and the session completes when the count reaches
//! zero — there are no correlation IDs, so servers may answer out of request
//! order. The collected descriptors then go through the shared mapping pass
//! (see [`crate::descriptor`]) to produce a [`ServiceCatalog`].
//!
//! ## References
//!
//! * [gRPC Server Reflection Protocol](https://github.com/grpc/grpc/blob/master/doc/server-reflection.md)
use super::compat;
use crate::BoxError;
use crate::catalog::{SchemaCache, ServiceCatalog};
use crate::descriptor::{self, MappingError, TypeIndex};
use http_body::Body as HttpBody;
use indexmap::IndexMap;
use prost::Message;
use prost_types::FileDescriptorProto;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status, Streaming, client::GrpcService};
use tonic_reflection::pb::{v1, v1alpha};

/// Errors that can occur during a reflection session.
#[derive(Debug, thiserror::Error)]
pub enum ReflectionError {
    #[error(
        "failed to start a stream with the reflection server, reflection might not be supported: '{0}'"
    )]
    StreamInit(#[source] Status),

    #[error("the reflection stream returned an error status: '{0}'")]
    Stream(#[source] Status),

    #[error("reflection stream closed before every pending request was answered")]
    StreamClosed,

    #[error("internal error: failed to write a request to the reflection stream")]
    SendFailed,

    #[error("server returned reflection error code {code}: {message}")]
    Server { code: i32, message: String },

    #[error("protocol error: received unexpected response type: {0}")]
    UnexpectedResponse(String),

    #[error("failed to decode a file descriptor: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl ReflectionError {
    /// An `Unimplemented` transport status is the one condition that triggers
    /// the v1 → v1alpha fallback; everything else surfaces as-is.
    fn is_unimplemented(&self) -> bool {
        matches!(
            self,
            ReflectionError::StreamInit(status) | ReflectionError::Stream(status)
                if status.code() == Code::Unimplemented
        )
    }
}

/// Errors that can occur when connecting to a gRPC server.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("invalid URL '{0}': {1}")]
    InvalidUrl(String, #[source] tonic::transport::Error),
    #[error("failed to connect to '{0}': {1}")]
    ConnectionFailed(String, #[source] tonic::transport::Error),
}

// The host field of reflection requests is undocumented and servers ignore
// it, so we don't ask callers for one.
const EMPTY_HOST: &str = "";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProtocolVersion {
    V1,
    V1Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    AwaitingServiceList,
    AwaitingDescriptors,
}

/// A schema-discovery client generic over its transport.
#[derive(Debug, Clone)]
pub struct ReflectionClient<T = Channel> {
    service: T,
}

impl ReflectionClient<Channel> {
    /// Connects to a gRPC server.
    ///
    /// # Arguments
    ///
    /// * `addr` - The server URI (e.g., `http://localhost:50051`).
    pub async fn connect(addr: &str) -> Result<Self, ConnectError> {
        let endpoint = Endpoint::new(addr.to_string())
            .map_err(|e| ConnectError::InvalidUrl(addr.to_string(), e))?;

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| ConnectError::ConnectionFailed(addr.to_string(), e))?;

        Ok(Self::new(channel))
    }
}

impl<S> ReflectionClient<S>
where
    S: GrpcService<tonic::body::Body> + Clone,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Creates a client from an existing Tonic service/channel.
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Runs a full discovery session and returns the resolved catalog.
    ///
    /// The session starts on `grpc.reflection.v1` and falls back to
    /// `v1alpha` at most once, when the server reports `Unimplemented`.
    /// Sessions sharing `cache` are serialized; a starting session
    /// invalidates the cache in full, and a successful one repopulates it
    /// with every discovered `(service, method)` pair.
    ///
    /// The caller awaits the whole resolution: no partial or streaming
    /// results are exposed, and a failed session leaves the cache empty.
    pub async fn discover(&mut self, cache: &SchemaCache) -> Result<ServiceCatalog, ReflectionError> {
        let _session = cache.begin_session().await;
        cache.clear();

        let catalog = match self.run_session(ProtocolVersion::V1).await {
            Err(error) if error.is_unimplemented() => {
                tracing::debug!("v1 reflection unimplemented, retrying on v1alpha");
                self.run_session(ProtocolVersion::V1Alpha).await?
            }
            result => result?,
        };

        cache.populate(&catalog);
        Ok(catalog)
    }

    /// Lists the services exposed by the server, with the same one-shot
    /// version fallback as [`discover`](Self::discover).
    pub async fn list_services(&mut self) -> Result<Vec<String>, ReflectionError> {
        match self.list_services_once(ProtocolVersion::V1).await {
            Err(error) if error.is_unimplemented() => {
                tracing::debug!("v1 reflection unimplemented, retrying on v1alpha");
                self.list_services_once(ProtocolVersion::V1Alpha).await
            }
            result => result,
        }
    }

    async fn run_session(
        &mut self,
        version: ProtocolVersion,
    ) -> Result<ServiceCatalog, ReflectionError> {
        use v1::server_reflection_response::MessageResponse;

        let (sink, mut stream) = self.open_stream(version).await?;

        let mut state = SessionState::AwaitingServiceList;
        let mut pending: usize = 1;
        let mut files: IndexMap<String, FileDescriptorProto> = IndexMap::new();
        let mut index = TypeIndex::default();
        let mut requested: HashSet<String> = HashSet::new();

        sink.send(list_services_request()).await?;

        while pending > 0 {
            let response = stream
                .message()
                .await
                .map_err(ReflectionError::Stream)?
                .ok_or(ReflectionError::StreamClosed)?;

            pending -= 1;

            match response.message_response {
                Some(MessageResponse::ListServicesResponse(list))
                    if state == SessionState::AwaitingServiceList =>
                {
                    tracing::debug!(services = list.service.len(), "received service list");
                    for service in list.service {
                        if requested.insert(service.name.clone()) {
                            sink.send(symbol_request(&service.name)).await?;
                            pending += 1;
                        }
                    }
                    state = SessionState::AwaitingDescriptors;
                }
                Some(MessageResponse::FileDescriptorResponse(batch))
                    if state == SessionState::AwaitingDescriptors =>
                {
                    pending += process_descriptor_batch(
                        batch.file_descriptor_proto,
                        &mut files,
                        &mut index,
                        &mut requested,
                        &sink,
                    )
                    .await?;
                }
                Some(MessageResponse::ErrorResponse(error)) => {
                    return Err(ReflectionError::Server {
                        code: error.error_code,
                        message: error.error_message,
                    });
                }
                Some(other) => {
                    return Err(ReflectionError::UnexpectedResponse(format!("{other:?}")));
                }
                None => {
                    return Err(ReflectionError::UnexpectedResponse("empty message".into()));
                }
            }
        }

        let catalog = descriptor::build_catalog(files.values())?;
        tracing::debug!(
            files = files.len(),
            methods = catalog.len(),
            "reflection session complete"
        );
        Ok(catalog)
    }

    async fn list_services_once(
        &mut self,
        version: ProtocolVersion,
    ) -> Result<Vec<String>, ReflectionError> {
        use v1::server_reflection_response::MessageResponse;

        let (sink, mut stream) = self.open_stream(version).await?;
        sink.send(list_services_request()).await?;

        let response = stream
            .message()
            .await
            .map_err(ReflectionError::Stream)?
            .ok_or(ReflectionError::StreamClosed)?;

        match response.message_response {
            Some(MessageResponse::ListServicesResponse(list)) => {
                Ok(list.service.into_iter().map(|s| s.name).collect())
            }
            Some(MessageResponse::ErrorResponse(error)) => Err(ReflectionError::Server {
                code: error.error_code,
                message: error.error_message,
            }),
            Some(other) => Err(ReflectionError::UnexpectedResponse(format!("{other:?}"))),
            None => Err(ReflectionError::UnexpectedResponse("empty message".into())),
        }
    }

    async fn open_stream(
        &mut self,
        version: ProtocolVersion,
    ) -> Result<(RequestSink, ResponseStream), ReflectionError> {
        match version {
            ProtocolVersion::V1 => {
                let (tx, rx) = mpsc::channel(100);
                let mut client = v1::server_reflection_client::ServerReflectionClient::new(
                    self.service.clone(),
                );
                let stream = client
                    .server_reflection_info(ReceiverStream::new(rx))
                    .await
                    .map_err(ReflectionError::StreamInit)?
                    .into_inner();
                Ok((RequestSink::V1(tx), ResponseStream::V1(stream)))
            }
            ProtocolVersion::V1Alpha => {
                let (tx, rx) = mpsc::channel(100);
                let mut client = v1alpha::server_reflection_client::ServerReflectionClient::new(
                    self.service.clone(),
                );
                let stream = client
                    .server_reflection_info(ReceiverStream::new(rx))
                    .await
                    .map_err(ReflectionError::StreamInit)?
                    .into_inner();
                Ok((RequestSink::V1Alpha(tx), ResponseStream::V1Alpha(stream)))
            }
        }
    }
}

/// Decodes a batch of raw descriptors, merges newly-seen types into the
/// lookup tables, and writes follow-up requests for anything still missing:
/// declared imports by filename, unresolved method request/response types by
/// symbol. Returns the number of requests written.
async fn process_descriptor_batch(
    raw_protos: Vec<Vec<u8>>,
    files: &mut IndexMap<String, FileDescriptorProto>,
    index: &mut TypeIndex,
    requested: &mut HashSet<String>,
    sink: &RequestSink,
) -> Result<usize, ReflectionError> {
    let mut sent = 0;

    for raw in raw_protos {
        let file = FileDescriptorProto::decode(raw.as_ref())?;
        let name = file.name().to_string();
        if name.is_empty() || files.contains_key(&name) {
            continue;
        }

        index.register_file(&file);

        for dependency in &file.dependency {
            if !files.contains_key(dependency) && requested.insert(dependency.clone()) {
                sink.send(filename_request(dependency)).await?;
                sent += 1;
            }
        }

        for service in &file.service {
            for method in &service.method {
                for type_name in [method.input_type(), method.output_type()] {
                    if !index.contains_symbol(type_name) {
                        let symbol = type_name.trim_start_matches('.').to_string();
                        if requested.insert(symbol.clone()) {
                            sink.send(symbol_request(&symbol)).await?;
                            sent += 1;
                        }
                    }
                }
            }
        }

        files.insert(name, file);
    }

    Ok(sent)
}

/// The request side of a versioned session stream. v1alpha sessions convert
/// on the way out so the state machine only ever builds v1 requests.
enum RequestSink {
    V1(mpsc::Sender<v1::ServerReflectionRequest>),
    V1Alpha(mpsc::Sender<v1alpha::ServerReflectionRequest>),
}

impl RequestSink {
    async fn send(&self, request: v1::ServerReflectionRequest) -> Result<(), ReflectionError> {
        match self {
            RequestSink::V1(tx) => tx
                .send(request)
                .await
                .map_err(|_| ReflectionError::SendFailed),
            RequestSink::V1Alpha(tx) => tx
                .send(compat::request_to_v1alpha(request))
                .await
                .map_err(|_| ReflectionError::SendFailed),
        }
    }
}

/// The response side of a versioned session stream; v1alpha responses convert
/// on the way in.
enum ResponseStream {
    V1(Streaming<v1::ServerReflectionResponse>),
    V1Alpha(Streaming<v1alpha::ServerReflectionResponse>),
}

impl ResponseStream {
    async fn message(&mut self) -> Result<Option<v1::ServerReflectionResponse>, Status> {
        match self {
            ResponseStream::V1(stream) => stream.message().await,
            ResponseStream::V1Alpha(stream) => {
                Ok(stream.message().await?.map(compat::response_to_v1))
            }
        }
    }
}

fn list_services_request() -> v1::ServerReflectionRequest {
    v1::ServerReflectionRequest {
        host: EMPTY_HOST.to_string(),
        message_request: Some(v1::server_reflection_request::MessageRequest::ListServices(
            String::new(),
        )),
    }
}

fn symbol_request(symbol: &str) -> v1::ServerReflectionRequest {
    v1::ServerReflectionRequest {
        host: EMPTY_HOST.to_string(),
        message_request: Some(
            v1::server_reflection_request::MessageRequest::FileContainingSymbol(
                symbol.trim_start_matches('.').to_string(),
            ),
        ),
    }
}

fn filename_request(filename: &str) -> v1::ServerReflectionRequest {
    v1::ServerReflectionRequest {
        host: EMPTY_HOST.to_string(),
        message_request: Some(v1::server_reflection_request::MessageRequest::FileByFilename(
            filename.to_string(),
        )),
    }
}
