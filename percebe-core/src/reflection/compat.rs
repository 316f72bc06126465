//! Wire-type conversions between the two reflection protocol versions.
//!
//! The `v1` and `v1alpha` messages are field-for-field identical; mapping
//! v1alpha traffic onto the v1 shapes lets the session state machine be
//! written once against v1.
use tonic_reflection::pb::{v1, v1alpha};

pub(crate) fn request_to_v1alpha(
    request: v1::ServerReflectionRequest,
) -> v1alpha::ServerReflectionRequest {
    use v1::server_reflection_request::MessageRequest as V1;
    use v1alpha::server_reflection_request::MessageRequest as Alpha;

    let message_request = request.message_request.map(|message| match message {
        V1::FileByFilename(filename) => Alpha::FileByFilename(filename),
        V1::FileContainingSymbol(symbol) => Alpha::FileContainingSymbol(symbol),
        V1::FileContainingExtension(extension) => {
            Alpha::FileContainingExtension(v1alpha::ExtensionRequest {
                containing_type: extension.containing_type,
                extension_number: extension.extension_number,
            })
        }
        V1::AllExtensionNumbersOfType(name) => Alpha::AllExtensionNumbersOfType(name),
        V1::ListServices(filter) => Alpha::ListServices(filter),
    });

    v1alpha::ServerReflectionRequest {
        host: request.host,
        message_request,
    }
}

pub(crate) fn response_to_v1(
    response: v1alpha::ServerReflectionResponse,
) -> v1::ServerReflectionResponse {
    use v1::server_reflection_response::MessageResponse as V1;
    use v1alpha::server_reflection_response::MessageResponse as Alpha;

    let message_response = response.message_response.map(|message| match message {
        Alpha::FileDescriptorResponse(body) => {
            V1::FileDescriptorResponse(v1::FileDescriptorResponse {
                file_descriptor_proto: body.file_descriptor_proto,
            })
        }
        Alpha::AllExtensionNumbersResponse(body) => {
            V1::AllExtensionNumbersResponse(v1::ExtensionNumberResponse {
                base_type_name: body.base_type_name,
                extension_number: body.extension_number,
            })
        }
        Alpha::ListServicesResponse(body) => V1::ListServicesResponse(v1::ListServiceResponse {
            service: body
                .service
                .into_iter()
                .map(|service| v1::ServiceResponse { name: service.name })
                .collect(),
        }),
        Alpha::ErrorResponse(body) => V1::ErrorResponse(v1::ErrorResponse {
            error_code: body.error_code,
            error_message: body.error_message,
        }),
    });

    v1::ServerReflectionResponse {
        valid_host: response.valid_host,
        original_request: None,
        message_response,
    }
}
