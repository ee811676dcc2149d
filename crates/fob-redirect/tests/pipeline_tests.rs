//! End-to-end tests for the redirect transform hook.

mod helpers;

use fob_redirect::{
    AssetLoader, Loader, RedirectError, RedirectPipeline, TransformArgs, VirtualModuleStore,
};
use helpers::{FakeAssetResolver, FixedCssModules, Project, pipeline, transform};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_extensionless_import_gets_mjs() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({ "autoExtension": true })));

    let code = "import x from './a';\nexport { y } from './b';\nconst z = require('./c');";
    let out = transform(&pipeline, code, project.path("src/index.ts")).await;

    assert_eq!(
        out.code,
        "import x from './a.mjs';\nexport { y } from './b.mjs';\nconst z = require('./c.mjs');"
    );
    assert!(out.map.is_some());
}

#[tokio::test]
async fn test_tsx_suffix_becomes_js() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({})));

    let out = transform(
        &pipeline,
        "import x from './a.tsx';\nimport y from './b';",
        project.path("src/index.ts"),
    )
    .await;

    // `.js` outside an ESM package leaves extensionless imports alone
    assert_eq!(out.code, "import x from './a.js';\nimport y from './b';");
}

#[tokio::test]
async fn test_module_package_extensions() {
    let project = Project::new();
    project.write("package.json", r#"{ "type": "module" }"#);

    let esm = pipeline(project.config(json!({ "autoExtension": true })));
    let out = transform(&esm, "import x from './a';", project.path("src/index.ts")).await;
    assert_eq!(out.code, "import x from './a.js';");

    let cjs = pipeline(project.config(json!({ "autoExtension": true, "format": "cjs" })));
    let out = transform(&cjs, "const x = require('./a');", project.path("src/index.ts")).await;
    assert_eq!(out.code, "const x = require('./a.cjs');");
}

#[tokio::test]
async fn test_bare_specifier_without_aliases_untouched() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({ "autoExtension": true })));

    let code = "const sub = require('pkg/sub');";
    let out = transform(&pipeline, code, project.path("src/index.ts")).await;
    assert_eq!(out.code, code);
    assert!(out.map.is_none());
}

#[tokio::test]
async fn test_no_specifiers_is_byte_identical() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({ "autoExtension": true })));

    let code = "export const answer = 42;\n// import x from './commented';\n";
    let out = transform(&pipeline, code, project.path("src/index.ts")).await;
    assert_eq!(out.code, code);
    assert!(out.map.is_none());
}

#[tokio::test]
async fn test_second_pass_is_noop() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({ "autoExtension": true })));
    let file = project.path("src/index.ts");

    let first = transform(&pipeline, "import a from './a';\nimport b from './b.ts';", &file).await;
    assert_eq!(first.code, "import a from './a.mjs';\nimport b from './b.mjs';");

    let second = transform(&pipeline, &first.code, &file).await;
    assert_eq!(second.code, first.code);
    assert!(second.map.is_none());
}

#[tokio::test]
async fn test_quote_style_preserved() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({ "autoExtension": true })));

    let out = transform(
        &pipeline,
        r#"import x from "./a"; const y = await import("./b");"#,
        project.path("src/index.ts"),
    )
    .await;
    assert_eq!(
        out.code,
        r#"import x from "./a.mjs"; const y = await import("./b.mjs");"#
    );
}

#[tokio::test]
async fn test_alias_to_relative_path() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({
        "resolve": { "alias": { "@": "./src" } }
    })));

    let out = transform(
        &pipeline,
        "import { format } from '@/utils/format';",
        project.path("src/pages/home.ts"),
    )
    .await;
    assert_eq!(out.code, "import { format } from '../utils/format';");
}

#[tokio::test]
async fn test_alias_then_extension_last_edit_wins() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({
        "autoExtension": true,
        "resolve": { "alias": { "@": "./src" } }
    })));

    let out = transform(
        &pipeline,
        "import { format } from '@/utils/format';",
        project.path("src/pages/home.ts"),
    )
    .await;
    assert_eq!(out.code, "import { format } from '../utils/format.mjs';");
}

#[tokio::test]
async fn test_module_id_alias_verbatim() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({
        "autoExtension": true,
        "resolve": { "alias": { "lodash": "lodash-es" } }
    })));

    let out = transform(
        &pipeline,
        "import debounce from 'lodash/debounce';\nimport _ from 'lodash';",
        project.path("src/index.ts"),
    )
    .await;
    assert_eq!(
        out.code,
        "import debounce from 'lodash-es/debounce';\nimport _ from 'lodash-es';"
    );
}

#[tokio::test]
async fn test_first_listed_alias_wins() {
    let project = Project::new();
    let x = project.path("x").to_string_lossy().into_owned();
    let y = project.path("y").to_string_lossy().into_owned();
    let pipeline = pipeline(project.config(json!({
        "resolve": { "alias": { "@a": x, "@a/b": y } }
    })));

    let out = transform(&pipeline, "import c from '@a/b/c';", project.path("src/index.ts")).await;
    assert_eq!(out.code, "import c from '../x/b/c';");
}

#[tokio::test]
async fn test_legacy_alias_without_module_ids() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({
        "alias": { "~": "./src" }
    })));

    let out = transform(
        &pipeline,
        "import u from '~/utils';\nimport React from 'react';",
        project.path("src/index.ts"),
    )
    .await;
    assert_eq!(out.code, "import u from './utils';\nimport React from 'react';");
}

#[tokio::test]
async fn test_tsconfig_paths() {
    let project = Project::new();
    project.write(
        "tsconfig.json",
        r#"{
            // path mapping
            "compilerOptions": {
                "baseUrl": ".",
                "paths": { "~/*": ["src/*"] }
            }
        }"#,
    );
    project.write("src/utils.ts", "export const u = 1;");
    let pipeline = pipeline(project.config(json!({})));

    let out = transform(
        &pipeline,
        "import { u } from '~/utils';\nimport React from 'react';",
        project.path("src/pages/home.ts"),
    )
    .await;
    assert_eq!(out.code, "import { u } from '../utils';\nimport React from 'react';");
}

#[tokio::test]
async fn test_disabled_policies() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({
        "autoExtension": true,
        "resolve": { "alias": { "@": "./src" } },
        "redirect": { "alias": false, "autoExtension": false }
    })));

    let code = "import a from '@/a';\nimport b from './b';";
    let out = transform(&pipeline, code, project.path("src/index.ts")).await;
    assert_eq!(out.code, code);
}

#[tokio::test]
async fn test_stylesheet_redirect() {
    let project = Project::new();
    let file = project.path("src/index.ts");
    let code = "import './a.scss';\nimport 'pkg/theme.less';";

    let modules = RedirectPipeline::builder(project.config(json!({})))
        .css_module_detector(Arc::new(FixedCssModules(true)))
        .build()
        .unwrap();
    let out = transform(&modules, code, &file).await;
    assert_eq!(out.code, "import './a';\nimport 'pkg/theme.less';");

    let plain = RedirectPipeline::builder(project.config(json!({})))
        .css_module_detector(Arc::new(FixedCssModules(false)))
        .build()
        .unwrap();
    let out = transform(&plain, code, &file).await;
    assert_eq!(out.code, "import './a.css';\nimport 'pkg/theme.less';");
}

#[tokio::test]
async fn test_default_auto_modules_detection() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({})));

    let out = transform(
        &pipeline,
        "import s from './button.module.less';\nimport './global.sass';",
        project.path("src/index.ts"),
    )
    .await;
    assert_eq!(
        out.code,
        "import s from './button.module';\nimport './global.css';"
    );
}

#[tokio::test]
async fn test_virtual_css_emitted_next_to_output() {
    let project = Project::new();
    let store = VirtualModuleStore::new();
    store.insert("h1", ".button_x { color: red }");

    let pipeline = RedirectPipeline::builder(project.config(json!({})))
        .virtual_modules(store)
        .build()
        .unwrap();

    let out = transform(
        &pipeline,
        "import styles from './button.module.css?css_virtual&hash=h1';",
        project.path("src/pages/button.tsx"),
    )
    .await;
    assert_eq!(out.code, "import styles from './button_module.css';");

    let emitted = pipeline
        .outputs()
        .get(&project.path("dist/pages/button_module.css"))
        .expect("virtual css should be emitted");
    assert_eq!(emitted.contents, b".button_x { color: red }");
}

#[tokio::test]
async fn test_missing_virtual_css_fails_file() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({})));

    let err = pipeline
        .transform(TransformArgs::new(
            "import styles from './a.module.css?css_virtual&hash=gone';",
            project.path("src/index.ts"),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, RedirectError::VirtualModuleMissing { .. }));
}

#[tokio::test]
async fn test_svg_component_asset() {
    let project = Project::new();
    let resolver = FakeAssetResolver::new(AssetLoader::Jsx);
    let pipeline = RedirectPipeline::builder(project.config(json!({})))
        .asset_resolver(resolver.clone())
        .build()
        .unwrap();

    let out = transform(
        &pipeline,
        "import Icon from './icon.svg';",
        project.path("src/index.ts"),
    )
    .await;
    assert_eq!(out.code, "import Icon from './icon.js';");

    let calls = resolver.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, project.path("src/icon.svg"));
    assert_eq!(calls[0].1, project.path("dist"));
    assert!(calls[0].2);
}

#[tokio::test]
async fn test_url_asset_uses_resolver_path() {
    let project = Project::new();
    let pipeline = RedirectPipeline::builder(project.config(json!({})))
        .asset_resolver(FakeAssetResolver::new(AssetLoader::Url))
        .build()
        .unwrap();

    let out = transform(
        &pipeline,
        "import logo from '../assets/logo.png';",
        project.path("src/pages/home.ts"),
    )
    .await;
    assert_eq!(out.code, "import logo from './static/logo.png';");
}

#[tokio::test]
async fn test_filesystem_asset_emitted_once() {
    let project = Project::new();
    project.write("src/logo.png", b"\x89PNG\r\n");
    let pipeline = pipeline(project.config(json!({})));

    let code = "import logo from './logo.png';";
    let (a, b) = tokio::join!(
        transform(&pipeline, code, project.path("src/a.ts")),
        transform(&pipeline, code, project.path("src/b.ts")),
    );
    assert_eq!(a.code, b.code);
    assert!(a.code.starts_with("import logo from './assets/logo-"));
    assert!(a.code.ends_with(".png';"));

    let outputs = pipeline.outputs().all();
    assert_eq!(outputs.len(), 1);
    assert!(outputs[0].file_name.starts_with(project.path("dist/assets")));
    assert_eq!(outputs[0].contents, b"\x89PNG\r\n");
}

#[tokio::test]
async fn test_missing_asset_fails_file() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({})));

    let err = pipeline
        .transform(TransformArgs::new(
            "import logo from './missing.png';",
            project.path("src/index.ts"),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, RedirectError::AssetResolution { .. }));
}

#[tokio::test]
async fn test_parse_error_passes_through() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({ "autoExtension": true })));

    let code = "import { a from './a';";
    let out = transform(&pipeline, code, project.path("src/index.ts")).await;
    assert_eq!(out.code, code);
    assert!(out.map.is_none());
}

#[tokio::test]
async fn test_jsx_in_js_module() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({ "autoExtension": true })));
    let code = "import x from './a';\nexport const App = () => <div>{x}</div>;";
    let expected = "import x from './a.mjs';\nexport const App = () => <div>{x}</div>;";

    let out = transform(&pipeline, code, project.path("src/App.js")).await;
    assert_eq!(out.code, expected);

    let out = pipeline
        .transform(TransformArgs::new(code, project.path("src/App.js")).with_loader(Loader::Js))
        .await
        .unwrap();
    assert_eq!(out.code, expected);
}

#[tokio::test]
async fn test_tsx_variant_extension() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({ "autoExtension": true })));
    let code = "import x from './a';\nconst App = (p: { n: number }) => <b>{p.n}</b>;";
    let out = transform(&pipeline, code, project.path("src/App.mtsx")).await;
    assert!(out.code.starts_with("import x from './a.mjs';"));
}

#[tokio::test]
async fn test_commonjs_top_level_return() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({ "autoExtension": true })));
    let code = "const b = require('./b');\nif (b) return;";
    let out = transform(&pipeline, code, project.path("src/legacy.js")).await;
    assert_eq!(out.code, "const b = require('./b.mjs');\nif (b) return;");
}

#[tokio::test]
async fn test_output_extension_fixed_at_build() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({ "autoExtension": true, "format": "cjs" })));
    assert_eq!(pipeline.output_extension().js_extension, ".js");

    project.write("package.json", r#"{ "type": "module" }"#);
    let code = "const x = require('./a');";
    let out = transform(&pipeline, code, project.path("src/index.ts")).await;
    assert_eq!(out.code, code);
    assert_eq!(pipeline.output_extension().js_extension, ".js");
}

#[tokio::test]
async fn test_bundle_formats_skipped() {
    let project = Project::new();
    for format in ["iife", "umd"] {
        let pipeline = pipeline(project.config(json!({ "autoExtension": true, "format": format })));
        let code = "import x from './a';";
        let out = transform(&pipeline, code, project.path("src/index.ts")).await;
        assert_eq!(out.code, code, "format {format} should not be redirected");
    }
}

#[tokio::test]
async fn test_loader_decides_for_unknown_extension() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({ "autoExtension": true })));
    let code = "import x from './a';";

    let untouched = transform(&pipeline, code, project.path("src/App.vue")).await;
    assert_eq!(untouched.code, code);

    let out = pipeline
        .transform(TransformArgs::new(code, project.path("src/App.vue")).with_loader(Loader::Ts))
        .await
        .unwrap();
    assert_eq!(out.code, "import x from './a.mjs';");
}

#[tokio::test]
async fn test_empty_source_skipped() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({ "autoExtension": true })));
    let out = transform(&pipeline, "", project.path("src/index.ts")).await;
    assert_eq!(out.code, "");
    assert!(out.map.is_none());
}

#[tokio::test]
async fn test_many_specifiers_in_one_file() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({ "autoExtension": true })));

    let code: String = (0..32)
        .map(|i| format!("import m{i} from './m{i}';\n"))
        .collect();
    let expected: String = (0..32)
        .map(|i| format!("import m{i} from './m{i}.mjs';\n"))
        .collect();

    let out = transform(&pipeline, &code, project.path("src/index.ts")).await;
    assert_eq!(out.code, expected);
}

#[tokio::test]
async fn test_source_map_embeds_original() {
    let project = Project::new();
    let pipeline = pipeline(project.config(json!({ "autoExtension": true })));

    let code = "import x from './a';\nconsole.log(x);\n";
    let out = transform(&pipeline, code, project.path("src/index.ts")).await;
    let map = out.map.expect("rewritten file should carry a map");

    let json = map.to_json_string();
    assert!(json.contains("index.ts"));
    assert!(json.contains("sourcesContent"));
    assert!(json.contains("console.log(x);"));

    let token = map
        .get_tokens()
        .find(|t| t.get_dst_line() == 1 && t.get_dst_col() == 0)
        .expect("second line mapped");
    assert_eq!(token.get_src_line(), 1);
    assert_eq!(token.get_src_col(), 0);
}
