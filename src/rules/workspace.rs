//! WORKSPACE rules: project identity and external repositories.

use std::path::PathBuf;

use crate::core::repository::RepositoryReference;
use crate::dsl::value::{Invocation, Value};
use crate::resolver::ConvertError;
use crate::rules::{RuleContext, RuleScope, RuleTable};

pub fn register(table: &mut RuleTable) {
    table.register("workspace", RuleScope::Workspace, workspace);
    table.register("http_archive", RuleScope::Workspace, http_archive);
    table.register("local_repository", RuleScope::Workspace, local_repository);
    table.register("git_repository", RuleScope::Workspace, git_repository);
    table.register("new_git_repository", RuleScope::Workspace, git_repository);
}

fn workspace(ctx: &mut RuleContext<'_, '_>, invocation: &Invocation) -> Result<Value, ConvertError> {
    let name = invocation.require_str("name")?;
    ctx.project.push_prelude(&format!("project({})", name));
    ctx.project.name = Some(name);
    Ok(Value::None)
}

fn http_archive(ctx: &mut RuleContext<'_, '_>, invocation: &Invocation) -> Result<Value, ConvertError> {
    let name = invocation.require_str("name")?;

    let mut urls = invocation.str_list("urls")?;
    if let Some(url) = invocation.opt_str("url")? {
        urls.push(url);
    }
    if urls.is_empty() {
        return Err(ConvertError::MissingArgument {
            rule: invocation.kind.clone(),
            argument: "urls".to_string(),
            location: invocation.location.clone(),
        });
    }

    let reference = RepositoryReference::archive(
        name,
        urls,
        invocation.opt_str("strip_prefix")?,
        invocation.opt_str("sha256")?,
        ctx.dirs.current(),
    );
    resolve(ctx, reference)
}

fn local_repository(
    ctx: &mut RuleContext<'_, '_>,
    invocation: &Invocation,
) -> Result<Value, ConvertError> {
    let name = invocation.require_str("name")?;
    let path = PathBuf::from(invocation.require_str("path")?);
    let reference = RepositoryReference::local(name, path, ctx.dirs.current());
    resolve(ctx, reference)
}

fn git_repository(ctx: &mut RuleContext<'_, '_>, invocation: &Invocation) -> Result<Value, ConvertError> {
    let name = invocation.require_str("name")?;
    let remote = invocation.opt_str("remote")?.unwrap_or_default();
    let reference = RepositoryReference::git(name, remote, ctx.dirs.current());
    resolve(ctx, reference)
}

fn resolve(ctx: &mut RuleContext<'_, '_>, reference: RepositoryReference) -> Result<Value, ConvertError> {
    ctx.resolver
        .resolve_repository(ctx.project, ctx.dirs, &reference)?;
    Ok(Value::None)
}
