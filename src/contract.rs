//! Markers of the structured-text template shared by the interpreter prompt
//! and the task parser.

/// A line starting with this token opens a subtask block.
pub const BLOCK_MARKER: &str = "### Tarea";
/// Separators between the block number and the title. The title follows the
/// last en-dash; the others are fallbacks for headers without one.
pub const TITLE_SEPARATORS: &[&str] = &["–", "—", " - "];

pub const PROJECT_MARKERS: &[&str] = &["Proyecto:"];
pub const DESCRIPTION_MARKERS: &[&str] = &["Descripcion:", "Descripción:"];
pub const CRITERIA_MARKERS: &[&str] = &["Criterios de aceptación:", "Criterios de aceptacion:"];
pub const PRIORITY_MARKERS: &[&str] = &["Priority:"];
pub const TAGS_MARKERS: &[&str] = &["Tags:"];

pub const CRITERIA_BULLET: &str = "- ";
pub const RULE_LINE: &str = "---";

/// Label and bullet used when criteria are folded into the issue description.
pub const CRITERIA_HEADING: &str = "**Criterios de aceptación:**";
pub const RENDERED_BULLET: &str = "• ";

/// Build the prompt that asks the interpreter to rewrite free text into the template.
pub fn build_prompt(user_text: &str) -> String {
    format!(
        r#"Eres un asistente que organiza y planifica tareas en un formato de texto estructurado.

Cada tarea debe incluir:
- {project} nombre del proyecto al que pertenece (infiérelo del contexto, ej: "Sistema de Pagos", "App Mobile", "Backend API").
- Título de como máximo 70 caracteres, claro y directo.
- {description} detallada, con contexto técnico, objetivo y pasos clave.
- {criteria} en formato Given/When/Then, entre 2 y 5.
- {priority} urgent | high | medium | low.
- {tags} entre 3 y 6, en kebab-case (ej: frontend, api, ux-ui, ai-automation).

Si varias tareas están relacionadas, define una Tarea Padre y enumera las subtareas como Tarea 1.1, 1.2, etc.
Cada subtarea lleva todas sus propiedades completas.
Si el usuario pide cosas sin relación, organízalas en varias tareas padre.
Responde solo con texto plano, sin bloques de código.

Formato de salida:

## Tarea Padre 1: [Nombre de la tarea padre]

{block} 1.1 – [Título de la subtarea]
{project} [Nombre del proyecto]
{description}
[...]

{criteria}
{bullet}Given [...] When [...] Then [...]
{bullet}Given [...] When [...] Then [...]

{priority} high
{tags} frontend, api, ux-ui

{rule}

{block} 1.2 – [Título de la subtarea]
{project} [Nombre del proyecto]
{description}
[...]

{criteria}
{bullet}Given [...] When [...] Then [...]

{priority} medium
{tags} n8n, api, automation

{rule}

Texto del usuario:
{user_text}
"#,
        block = BLOCK_MARKER,
        project = PROJECT_MARKERS[0],
        description = DESCRIPTION_MARKERS[0],
        criteria = CRITERIA_MARKERS[0],
        priority = PRIORITY_MARKERS[0],
        tags = TAGS_MARKERS[0],
        bullet = CRITERIA_BULLET,
        rule = RULE_LINE,
        user_text = user_text.trim(),
    )
}
