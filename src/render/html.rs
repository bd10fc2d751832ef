use crate::model::Manifest;

/// Render a self-contained HTML preview (manifests embedded as JSON).
///
/// The template is filled with `replace` rather than `format!()` because the
/// embedded JS is full of `{}` and `${x}`.
pub fn render_html_report(manifests: &[Manifest]) -> anyhow::Result<String> {
    // Embedded as a JS array literal; "</" is escaped so names cannot close the script tag.
    let json = serde_json::to_string(manifests)?.replace("</", "<\\/");

    const TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Sprite atlas descriptors</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  .container { display: flex; height: calc(100vh - 58px); }
  .sidebar { width: 320px; border-right: 1px solid #ddd; padding: 12px; overflow: auto; }
  .main { flex: 1; padding: 12px; overflow: auto; }

  .summary { display: flex; gap: 16px; flex-wrap: wrap; font-size: 14px; color: #333; }
  .pill { padding: 4px 8px; border: 1px solid #ddd; border-radius: 999px; background: #fafafa; }

  .atlas { font-weight: 600; margin-top: 10px; cursor: pointer; }
  .sprite { cursor: pointer; user-select: none; padding: 2px 4px 2px 20px; border-radius: 4px; }
  .sprite:hover { background: #f3f3f3; }
  .sprite.selected { background: #e9f2ff; border: 1px solid #cfe3ff; }
  .muted { color: #777; font-size: 12px; }

  svg { border: 1px solid #ddd; background: #fcfcfc; margin-top: 8px; }
  .cell { fill: none; stroke: #e3e3e3; }
  .seed { fill: #999; }
  .seed.hit { fill: #d33; }

  table { border-collapse: collapse; width: 100%; margin-top: 8px; }
  th, td { border-bottom: 1px solid #eee; padding: 6px 8px; text-align: left; font-size: 14px; }
  th { background: white; border-bottom: 1px solid #ddd; }
  .num { text-align: right; font-variant-numeric: tabular-nums; }
  code { font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; font-size: 13px; }
</style>
</head>
<body>
<header>
  <div class="summary" id="summary"></div>
</header>

<div class="container">
  <div class="sidebar">
    <input id="search" placeholder="Search sprite..." style="width: 100%; box-sizing: border-box; padding: 6px 8px; border: 1px solid #ddd; border-radius: 6px;">
    <div id="list"></div>
  </div>

  <div class="main">
    <h2 id="title">Select a sprite</h2>
    <div id="meta" class="muted"></div>
    <svg id="grid" width="0" height="0"></svg>

    <table id="seedTable" style="display:none;">
      <thead>
        <tr>
          <th class="num">frame</th>
          <th>seed</th>
          <th>cell</th>
          <th class="num">scale</th>
          <th>uv</th>
        </tr>
      </thead>
      <tbody id="seedBody"></tbody>
    </table>
  </div>
</div>

<script>
// Embedded manifests (JSON array literal)
const DATA = __DATA__;
const CELL = 48;

const state = { atlas: 0, sprite: null, search: "" };

function fmt(x) {
  return String(Math.round(x * 1000) / 1000);
}

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function renderSummary() {
  let sprites = 0, seeds = 0, overrides = 0;
  for (const m of DATA) {
    sprites += m.totals.sprites;
    seeds += m.totals.seeds;
    overrides += m.totals.overridden_scales;
  }
  document.getElementById("summary").innerHTML = `
    <span class="pill">atlases: <b>${DATA.length}</b></span>
    <span class="pill">sprites: <b>${sprites}</b></span>
    <span class="pill">seeds: <b>${seeds}</b></span>
    <span class="pill">scale overrides: <b>${overrides}</b></span>
  `;
}

function renderList() {
  const root = document.getElementById("list");
  root.innerHTML = "";
  const s = state.search.toLowerCase();

  DATA.forEach((m, ai) => {
    const head = document.createElement("div");
    head.className = "atlas";
    head.innerHTML = `${escapeHtml(m.image)} <span class="muted">${m.grid.rows}x${m.grid.cols}, scale ${fmt(m.scale)}</span>`;
    head.onclick = () => select(ai, null);
    root.appendChild(head);

    for (const sp of m.sprites) {
      if (s && !sp.name.toLowerCase().includes(s)) continue;
      const row = document.createElement("div");
      const selected = state.atlas === ai && state.sprite === sp.name;
      row.className = "sprite" + (selected ? " selected" : "");
      const kind = sp.indexed ? `${sp.frames.length} frames` : "single";
      row.innerHTML = `${escapeHtml(sp.name)} <span class="muted">(${kind})</span>`;
      row.onclick = () => select(ai, sp.name);
      root.appendChild(row);
    }
  });
}

function renderGrid(m, sprite) {
  const svg = document.getElementById("grid");
  const w = m.grid.cols * CELL, h = m.grid.rows * CELL;
  svg.setAttribute("width", w);
  svg.setAttribute("height", h);

  let body = "";
  for (let r = 0; r < m.grid.rows; r++) {
    for (let c = 0; c < m.grid.cols; c++) {
      body += `<rect class="cell" x="${c * CELL}" y="${r * CELL}" width="${CELL}" height="${CELL}"></rect>`;
    }
  }
  for (const sp of m.sprites) {
    const hit = sprite && sp.name === sprite.name;
    for (const f of sp.frames) {
      const title = sp.indexed ? `${sp.name}[${f.index}]` : sp.name;
      body += `<circle class="seed${hit ? " hit" : ""}" cx="${f.x * CELL}" cy="${f.y * CELL}" r="${hit ? 6 : 4}"><title>${escapeHtml(title)}</title></circle>`;
      if (hit && sp.indexed) {
        body += `<text x="${f.x * CELL + 8}" y="${f.y * CELL - 8}" font-size="11">${f.index}</text>`;
      }
    }
  }
  svg.innerHTML = body;
}

function select(ai, name) {
  state.atlas = ai;
  state.sprite = name;
  const m = DATA[ai];
  const sprite = m.sprites.find((s) => s.name === name) || null;

  document.getElementById("title").textContent = sprite ? sprite.name : m.image;
  document.getElementById("meta").textContent =
    `${m.source} | image: ${m.image} | grid: ${m.grid.rows} rows x ${m.grid.cols} cols | scale: ${fmt(m.scale)}`;

  renderGrid(m, sprite);

  const tbl = document.getElementById("seedTable");
  const body = document.getElementById("seedBody");
  body.innerHTML = "";
  if (!sprite) {
    tbl.style.display = "none";
  } else {
    tbl.style.display = "table";
    for (const f of sprite.frames) {
      const tr = document.createElement("tr");
      tr.innerHTML = `
        <td class="num">${f.index}</td>
        <td><code>(${fmt(f.x)}, ${fmt(f.y)})</code></td>
        <td><code>(${f.cell[0]}, ${f.cell[1]})</code></td>
        <td class="num">${fmt(f.scale)}${f.scale_overridden ? " *" : ""}</td>
        <td><code>(${fmt(f.uv[0])}, ${fmt(f.uv[1])})</code></td>
      `;
      body.appendChild(tr);
    }
  }

  renderList();
}

document.getElementById("search").addEventListener("input", (e) => {
  state.search = e.target.value || "";
  renderList();
});

renderSummary();
if (DATA.length) select(0, null);
</script>
</body>
</html>
"#;

    Ok(TEMPLATE.replace("__DATA__", &json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::from_source;
    use crate::model::build_manifest;

    #[test]
    fn embeds_manifest_json() {
        let atlas = from_source(
            "image('a<b>.xcf') grid(8, 8) scale(8) sprites(gear=floodfill((2, 2)))",
            "a.sprites.py",
        )
        .unwrap();
        let html = render_html_report(&[build_manifest("a.sprites.py", &atlas)]).unwrap();

        assert!(html.starts_with("<!doctype html>"));
        assert!(!html.contains("__DATA__"));
        assert!(html.contains(r#"const DATA = [{"source":"a.sprites.py","image":"a<b>.xcf""#));
        assert!(html.contains(r#""name":"gear""#));
    }
}
