/*
 *  Heistbot - Discord bot keeping a heist credit ledger for Discord servers.
 *  Copyright (C) 2025  Manuel de Castro <manuel@infor.uva.es>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */
/*
 * The crate is a library only so that it can export the `log_cmd` procedural macro used by the
 * bot's commands (procedural macros must live in their own `proc-macro` crate).
 */
extern crate proc_macro;
use darling::ast::NestedMeta;
use darling::FromMeta;
use proc_macro::TokenStream;
use quote::ToTokens as _; // To use function.into_token_stream().
use syn::spanned::Spanned as _; // To use span() on language items.
use syn::{parse_macro_input, ItemFn};

/**
 * Arguments of `#[log_cmd]`: `#[log_cmd]` or `#[log_cmd(admin)]`.
 */
#[derive(Default, FromMeta)]
struct LogCmdArgs {
    /// Marks the command as an administrator command in the log.
    #[darling(default)]
    admin: bool,
}

/**
 * Logs every invocation of a command.
 *
 * Inserts `crate::utils::log_cmd!(ctx, admin)` as the first statement of the function, where `ctx`
 * is the function's first argument (the poise context).
 */
#[proc_macro_attribute]
pub fn log_cmd(macro_attrs: TokenStream, function: TokenStream) -> TokenStream {
    let attr_args = match NestedMeta::parse_meta_list(macro_attrs.into()) {
        Ok(args) => args,
        Err(err) => return darling::Error::from(err).write_errors().into(),
    };
    let args = match LogCmdArgs::from_list(&attr_args) {
        Ok(args) => args,
        Err(err) => return err.write_errors().into(),
    };
    let admin = args.admin;

    let mut function = parse_macro_input!(function as ItemFn);
    let Some(first_arg) = function.sig.inputs.first() else {
        return darling::Error::from(syn::Error::new(
            function.sig.span(),
            "[log_cmd] the command must take the context as its first argument",
        ))
        .write_errors()
        .into();
    };
    let syn::FnArg::Typed(ctx_arg) = first_arg else {
        return darling::Error::from(syn::Error::new(
            first_arg.span(),
            "[log_cmd] `self` cannot be the command context",
        ))
        .write_errors()
        .into();
    };
    let syn::Pat::Ident(ident) = &*ctx_arg.pat else {
        return darling::Error::from(syn::Error::new(
            ctx_arg.pat.span(),
            "[log_cmd] the context argument must be a plain identifier",
        ))
        .write_errors()
        .into();
    };
    let ctx_ident = ident.ident.clone();

    let log_stmt: syn::Stmt = syn::parse_quote! {
        crate::utils::log_cmd!(#ctx_ident, #admin);
    };
    function.block.stmts.insert(0, log_stmt);

    function.into_token_stream().into()
}
