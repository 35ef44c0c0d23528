/*
 * External collaborators the blog talks to: the image
 * upload service and the SMTP server. Both sit behind
 * a trait so the handlers can be tested without them.
 */
pub mod image_upload;
pub mod mail;
