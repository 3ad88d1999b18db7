//! Type supports for the request and response halves of a service.

use std::{fmt, sync::Arc};

use crate::descriptor::MessageDescriptor;
use crate::error::Result;
use crate::typesupport::{qualified_name, MessageTypeSupport, TypeSupport};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ServiceRole {
    Request,
    Response,
}

impl ServiceRole {
    pub fn suffix(self) -> &'static str {
        match self {
            ServiceRole::Request => "_Request_",
            ServiceRole::Response => "_Response_",
        }
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServiceRole::Request => f.write_str("request"),
            ServiceRole::Response => f.write_str("response"),
        }
    }
}

/// `<namespace>::dds_::<service>_Request_` or `..._Response_`.
pub fn service_type_name(namespace: &str, service: &str, role: ServiceRole) -> String {
    qualified_name(namespace, &format!("{}{}", service, role.suffix()))
}

/// One half of a service. Sizing and classification follow the member table
/// exactly as for a message; only the type name differs.
#[derive(Debug)]
pub struct ServiceTypeSupport {
    role: ServiceRole,
    service_name: String,
    inner: MessageTypeSupport,
}

impl ServiceTypeSupport {
    /// `namespace` is the service's `__`-separated namespace, e.g.
    /// `example_interfaces__srv`; `members` describes the request or
    /// response fields.
    pub fn new(
        namespace: &str,
        service_name: &str,
        role: ServiceRole,
        members: Arc<MessageDescriptor>,
    ) -> Result<Self> {
        let type_name = service_type_name(namespace, service_name, role);
        Ok(Self {
            role,
            service_name: service_name.to_owned(),
            inner: MessageTypeSupport::with_type_name(type_name, members)?,
        })
    }

    pub fn request(
        namespace: &str,
        service_name: &str,
        members: Arc<MessageDescriptor>,
    ) -> Result<Self> {
        Self::new(namespace, service_name, ServiceRole::Request, members)
    }

    pub fn response(
        namespace: &str,
        service_name: &str,
        members: Arc<MessageDescriptor>,
    ) -> Result<Self> {
        Self::new(namespace, service_name, ServiceRole::Response, members)
    }

    /// Builds both halves of a service at once.
    pub fn pair(
        namespace: &str,
        service_name: &str,
        request: Arc<MessageDescriptor>,
        response: Arc<MessageDescriptor>,
    ) -> Result<(Self, Self)> {
        Ok((
            Self::request(namespace, service_name, request)?,
            Self::response(namespace, service_name, response)?,
        ))
    }

    pub fn role(&self) -> ServiceRole {
        self.role
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl TypeSupport for ServiceTypeSupport {
    fn type_name(&self) -> &str {
        self.inner.type_name()
    }

    fn descriptor(&self) -> &Arc<MessageDescriptor> {
        self.inner.descriptor()
    }

    fn max_serialized_size(&self) -> u32 {
        self.inner.max_serialized_size()
    }

    fn is_plain(&self) -> bool {
        self.inner.is_plain()
    }

    fn is_bounded(&self) -> bool {
        self.inner.is_bounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{MemberKind, PrimitiveKind};

    fn add_two_ints() -> (Arc<MessageDescriptor>, Arc<MessageDescriptor>) {
        (
            Arc::new(
                MessageDescriptor::new("example_interfaces__srv", "AddTwoInts_Request")
                    .member("a", MemberKind::Primitive(PrimitiveKind::Int64))
                    .member("b", MemberKind::Primitive(PrimitiveKind::Int64)),
            ),
            Arc::new(
                MessageDescriptor::new("example_interfaces__srv", "AddTwoInts_Response")
                    .member("sum", MemberKind::Primitive(PrimitiveKind::Int64)),
            ),
        )
    }

    #[test]
    fn test_type_names() {
        assert_eq!(
            service_type_name("pkg__srv", "AddTwoInts", ServiceRole::Request),
            "pkg::srv::dds_::AddTwoInts_Request_"
        );
        assert_eq!(
            service_type_name("pkg__srv", "AddTwoInts", ServiceRole::Response),
            "pkg::srv::dds_::AddTwoInts_Response_"
        );
        assert_eq!(
            service_type_name("", "Ping", ServiceRole::Request),
            "dds_::Ping_Request_"
        );
    }

    #[test]
    fn test_pair() {
        let (req, resp) = add_two_ints();
        let (req, resp) = ServiceTypeSupport::pair("example_interfaces__srv", "AddTwoInts", req, resp)
                .unwrap();

        assert_eq!(req.role(), ServiceRole::Request);
        assert_eq!(req.service_name(), "AddTwoInts");
        assert_eq!(
            req.type_name(),
            "example_interfaces::srv::dds_::AddTwoInts_Request_"
        );
        assert_eq!(req.max_serialized_size(), 4 + 16);
        assert_eq!(resp.max_serialized_size(), 4 + 8);
        assert!(req.is_plain() && resp.is_plain());
    }

    #[test]
    fn test_empty_request() {
        let members = Arc::new(MessageDescriptor::new("std_srvs__srv", "Trigger_Request"));
        let ts = ServiceTypeSupport::request("std_srvs__srv", "Trigger", members).unwrap();
        assert_eq!(ts.max_serialized_size(), 8);
        assert!(ts.is_plain());
    }

    #[test]
    fn test_classification_downgrades() {
        let members = Arc::new(
            MessageDescriptor::new("std_srvs__srv", "Trigger_Response")
                .member("success", MemberKind::Primitive(PrimitiveKind::Bool))
                .member("message", MemberKind::string()),
        );
        let ts = ServiceTypeSupport::response("std_srvs__srv", "Trigger", members).unwrap();
        assert!(!ts.is_plain());
        assert!(!ts.is_bounded());
        // bool, pad, length, terminator
        assert_eq!(ts.max_serialized_size(), 4 + 12);

        let members = Arc::new(
            MessageDescriptor::new("pkg__srv", "Label_Request")
                .member("text", MemberKind::bounded_string(3)),
        );
        let ts = ServiceTypeSupport::request("pkg__srv", "Label", members).unwrap();
        assert!(!ts.is_plain());
        assert!(ts.is_bounded());
        assert_eq!(ts.max_serialized_size(), 4 + 8);
    }
}
