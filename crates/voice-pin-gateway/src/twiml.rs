//! TwiML rendering of gateway directives.

use crate::error::GatewayError;
use crate::flow::{Action, Directive, Gather};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Content type of rendered markup.
pub const CONTENT_TYPE: &str = "text/xml";

/// Render a directive as a TwiML `<Response>` document.
pub fn render(directive: &Directive) -> Result<String, GatewayError> {
    let mut writer = Writer::new(Vec::new());

    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write(&mut writer, Event::Start(BytesStart::new("Response")))?;

    for action in &directive.actions {
        match action {
            Action::Say(text) => {
                let mut say = BytesStart::new("Say");
                say.push_attribute(("language", directive.language.as_str()));
                write(&mut writer, Event::Start(say))?;
                write(&mut writer, Event::Text(BytesText::new(text)))?;
                write(&mut writer, Event::End(BytesEnd::new("Say")))?;
            }
            Action::Gather(gather) => {
                write(&mut writer, Event::Empty(gather_element(gather)))?;
            }
            Action::Redirect(target) => {
                let mut redirect = BytesStart::new("Redirect");
                redirect.push_attribute(("method", "POST"));
                write(&mut writer, Event::Start(redirect))?;
                write(&mut writer, Event::Text(BytesText::new(target)))?;
                write(&mut writer, Event::End(BytesEnd::new("Redirect")))?;
            }
            Action::Hangup => {
                write(&mut writer, Event::Empty(BytesStart::new("Hangup")))?;
            }
        }
    }

    write(&mut writer, Event::End(BytesEnd::new("Response")))?;

    String::from_utf8(writer.into_inner()).map_err(|e| GatewayError::Markup(e.to_string()))
}

fn gather_element(gather: &Gather) -> BytesStart<'_> {
    let timeout = gather.timeout.as_secs().to_string();
    let mut element = BytesStart::new("Gather");
    element.push_attribute(("action", gather.action.as_str()));
    element.push_attribute(("method", "POST"));
    element.push_attribute(("input", gather.input.as_str()));
    element.push_attribute(("timeout", timeout.as_str()));
    element.push_attribute(("finishOnKey", gather.finish_on_key.as_str()));
    element.push_attribute(("speechModel", gather.speech_model.as_str()));
    element.push_attribute(("language", gather.language.as_str()));
    element
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), GatewayError> {
    writer
        .write_event(event)
        .map_err(|e| GatewayError::Markup(e.to_string()))
}
