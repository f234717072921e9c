//! Placeholder component served when the completion service fails

use super::describe::LayoutDescription;

/// Characters of the description embedded in the placeholder
const EXCERPT_CHARS: usize = 100;

/// Renders a static React component for a failed generation
///
/// Pure and deterministic: the same description always yields byte-identical
/// source. The description excerpt sits inside a JSX comment, so any `*/` in it
/// is broken up to keep the comment closed where we expect.
pub fn fallback_component(description: &LayoutDescription) -> String {
    let excerpt: String = description
        .as_str()
        .chars()
        .take(EXCERPT_CHARS)
        .collect::<String>()
        .replace("*/", "* /");

    format!(
        r#"
import React from 'react';
import PropTypes from 'prop-types';

const GeneratedComponent = ({{ className }}) => {{
  return (
    <div className={{"p-4 bg-gray-100 rounded-lg shadow-md " + className}}>
      <h2 className="text-xl font-bold mb-4">Generated Component</h2>
      <p className="text-gray-600">
        {{/* Placeholder content based on image analysis */}}
        {{/* Image Analysis: {excerpt}... */}}
      </p>
    </div>
  );
}};

GeneratedComponent.propTypes = {{
  className: PropTypes.string
}};

GeneratedComponent.defaultProps = {{
  className: ''
}};

export default GeneratedComponent;
"#
    )
}
