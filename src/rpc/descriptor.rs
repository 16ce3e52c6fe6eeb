//! In-memory compilation of the engine's `.proto` interface description.

use std::path::Path;

use prost_reflect::{DescriptorPool, MethodDescriptor, ServiceDescriptor};
use protox::file::{File, FileResolver, GoogleFileResolver};

use crate::rpc::serialization::CommandKind;
use crate::rpc::{Result, RpcError};

const DESCRIPTOR_FILE_NAME: &str = "cmdExecutor.proto";

/// Resolves the fetched descriptor by name, and well-known types otherwise.
struct SourceResolver {
    name: String,
    source: String,
    google: GoogleFileResolver,
}

impl FileResolver for SourceResolver {
    fn resolve_path(&self, path: &Path) -> Option<String> {
        (path == Path::new(&self.name)).then(|| self.name.clone())
    }

    fn open_file(&self, name: &str) -> std::result::Result<File, protox::Error> {
        if name == self.name {
            File::from_source(name, &self.source)
        } else {
            self.google.open_file(name)
        }
    }
}

/// A compiled protocol descriptor, kept in memory only.
#[derive(Debug, Clone)]
pub struct ProtocolDescriptor {
    source: String,
    pool: DescriptorPool,
}

impl ProtocolDescriptor {
    /// Compile `.proto` source text.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let resolver = SourceResolver {
            name: DESCRIPTOR_FILE_NAME.to_string(),
            source: source.clone(),
            google: GoogleFileResolver::new(),
        };

        let mut compiler = protox::Compiler::with_file_resolver(resolver);
        compiler.include_imports(true);
        compiler
            .open_file(DESCRIPTOR_FILE_NAME)
            .map_err(|e| RpcError::InvalidDescriptor(e.to_string()))?;

        Ok(Self {
            source,
            pool: compiler.descriptor_pool(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    pub fn service(&self, name: &str) -> Result<ServiceDescriptor> {
        self.pool
            .get_service_by_name(name)
            .ok_or_else(|| RpcError::UnknownService(name.to_string()))
    }
}

/// Method path and `Cmd` enum numbers, resolved once per session.
#[derive(Debug, Clone)]
pub struct CommandTable {
    method: MethodDescriptor,
    check: i32,
    simulate: i32,
}

impl CommandTable {
    /// Look up `method` on `service` and the values of `enum_name` in the
    /// service's package. Every name must exist.
    pub fn resolve(service: &ServiceDescriptor, method: &str, enum_name: &str) -> Result<Self> {
        let method_desc = find_method(service, method)?;

        let package = service.package_name();
        let full_enum_name = if package.is_empty() {
            enum_name.to_string()
        } else {
            format!("{}.{}", package, enum_name)
        };
        let cmd_enum = service
            .parent_pool()
            .get_enum_by_name(&full_enum_name)
            .ok_or_else(|| RpcError::UnknownEnum(full_enum_name.clone()))?;

        let number = |kind: CommandKind| -> Result<i32> {
            cmd_enum
                .get_value_by_name(kind.wire_name())
                .map(|v| v.number())
                .ok_or_else(|| RpcError::UnknownEnumValue {
                    enum_name: full_enum_name.clone(),
                    value: kind.wire_name().to_string(),
                })
        };

        Ok(Self {
            check: number(CommandKind::Check)?,
            simulate: number(CommandKind::Simulate)?,
            method: method_desc,
        })
    }

    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    /// Wire value of the `Cmd` enum for `kind`.
    pub fn number(&self, kind: CommandKind) -> i32 {
        match kind {
            CommandKind::Check => self.check,
            CommandKind::Simulate => self.simulate,
        }
    }
}

pub(crate) fn find_method(service: &ServiceDescriptor, name: &str) -> Result<MethodDescriptor> {
    service
        .methods()
        .find(|m| m.name() == name)
        .ok_or_else(|| RpcError::UnknownMethod {
            service: service.full_name().to_string(),
            method: name.to_string(),
        })
}
