// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OpenAPI description of the HTTP surface

use axum::response::{IntoResponse, Redirect};
use axum::Json;
use serde_json::{json, Value};

use super::detect::IMAGE_FIELD;

/// OpenAPI 3 document for the node's endpoints
pub fn openapi_document() -> Value {
    let error_body = json!({
        "description": "Error",
        "content": {
            "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
        }
    });
    let image_body = json!({
        "description": "Processed image with detections drawn",
        "content": {
            "image/jpeg": { "schema": { "type": "string", "format": "binary" } },
            "image/png": { "schema": { "type": "string", "format": "binary" } }
        }
    });

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "YOLOv8 Object Detection",
            "description": "Detect objects in images and download the annotated result",
            "version": env!("CARGO_PKG_VERSION")
        },
        "paths": {
            "/detect": {
                "post": {
                    "summary": "Run object detection on an uploaded image",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "multipart/form-data": {
                                "schema": {
                                    "type": "object",
                                    "required": [IMAGE_FIELD],
                                    "properties": {
                                        IMAGE_FIELD: { "type": "string", "format": "binary" }
                                    }
                                }
                            }
                        }
                    },
                    "responses": {
                        "201": {
                            "description": "Detections and a link to the processed image",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/DetectResponse" }
                                }
                            }
                        },
                        "400": error_body,
                        "413": error_body,
                        "422": error_body,
                        "500": error_body
                    }
                }
            },
            "/download": {
                "get": {
                    "summary": "Download the most recently processed image",
                    "responses": { "200": image_body, "404": error_body }
                }
            },
            "/download/{id}": {
                "get": {
                    "summary": "Download the processed image of one request",
                    "parameters": [{
                        "name": "id",
                        "in": "path",
                        "required": true,
                        "schema": { "type": "string", "format": "uuid" }
                    }],
                    "responses": { "200": image_body, "404": error_body }
                }
            },
            "/health": {
                "get": {
                    "summary": "Service health",
                    "responses": { "200": { "description": "Service is up" } }
                }
            },
            "/version": {
                "get": {
                    "summary": "Build version and feature list",
                    "responses": { "200": { "description": "Version information" } }
                }
            }
        },
        "components": {
            "schemas": {
                "BoundingBox": {
                    "type": "object",
                    "properties": {
                        "x1": { "type": "number" },
                        "y1": { "type": "number" },
                        "x2": { "type": "number" },
                        "y2": { "type": "number" }
                    }
                },
                "Detection": {
                    "type": "object",
                    "properties": {
                        "bbox": { "$ref": "#/components/schemas/BoundingBox" },
                        "classId": { "type": "integer" },
                        "label": { "type": "string" },
                        "score": { "type": "number" }
                    }
                },
                "DetectResponse": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "fileName": { "type": "string" },
                        "contentType": { "type": "string" },
                        "width": { "type": "integer" },
                        "height": { "type": "integer" },
                        "detections": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/Detection" }
                        },
                        "processingTimeMs": { "type": "integer" },
                        "downloadUrl": { "type": "string" }
                    }
                },
                "ErrorResponse": {
                    "type": "object",
                    "properties": {
                        "errorType": { "type": "string" },
                        "message": { "type": "string" },
                        "requestId": { "type": "string", "nullable": true }
                    }
                }
            }
        }
    })
}

/// GET /api - OpenAPI document
pub async fn api_docs_handler() -> Json<Value> {
    Json(openapi_document())
}

/// GET / - Redirect to the API document
pub async fn root_handler() -> impl IntoResponse {
    Redirect::temporary("/api")
}
